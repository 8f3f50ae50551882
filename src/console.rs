use crate::priv_prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

enum Target {
    Stdout,
    Buffer(Vec<u8>),
}

/// A shared handle on the text output of a run. Clones write to the same place.
#[derive(Clone)]
pub struct Console {
    target: Rc<RefCell<Target>>,
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match *self.target.borrow() {
            Target::Stdout => "stdout",
            Target::Buffer(..) => "buffer",
        };
        f.debug_tuple("Console").field(&kind).finish()
    }
}

impl Console {
    pub fn stdout() -> Console {
        Console {
            target: Rc::new(RefCell::new(Target::Stdout)),
        }
    }

    /// A console that keeps everything written to it in memory.
    pub fn buffer() -> Console {
        Console {
            target: Rc::new(RefCell::new(Target::Buffer(Vec::new()))),
        }
    }

    /// Everything written so far, if this is a buffer console.
    pub fn captured(&self) -> Option<String> {
        match *self.target.borrow() {
            Target::Stdout => None,
            Target::Buffer(ref buf) => Some(String::from_utf8_lossy(buf).into_owned()),
        }
    }
}

impl Write for Console {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match *self.target.borrow_mut() {
            Target::Stdout => io::stdout().write(buf),
            Target::Buffer(ref mut out) => out.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match *self.target.borrow_mut() {
            Target::Stdout => io::stdout().flush(),
            Target::Buffer(..) => Ok(()),
        }
    }
}
