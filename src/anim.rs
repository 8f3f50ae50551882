//! The animation document: where nodes are, what they are called and how to draw them.

use crate::priv_prelude::*;
use crate::error::OutputError;
use crate::sim::{ChannelKind, NodeId, Simulator};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Default, Clone)]
struct NodeStyle {
    description: Option<String>,
    color: Option<Rgb>,
    size: Option<(f64, f64)>,
}

/// Collects per-node presentation attributes and writes them, along with the node positions
/// and point-to-point links of a simulation, as an `<anim>` document.
#[derive(Debug, Default, Clone)]
pub struct AnimationInterface {
    styles: BTreeMap<NodeId, NodeStyle>,
}

impl AnimationInterface {
    pub fn new() -> AnimationInterface {
        AnimationInterface::default()
    }

    pub fn update_node_description(&mut self, node: NodeId, description: &str) {
        self.styles.entry(node).or_default().description = Some(description.to_owned());
    }

    pub fn update_node_color(&mut self, node: NodeId, r: u8, g: u8, b: u8) {
        self.styles.entry(node).or_default().color = Some(Rgb(r, g, b));
    }

    pub fn update_node_size(&mut self, node: NodeId, width: f64, height: f64) {
        self.styles.entry(node).or_default().size = Some((width, height));
    }

    pub fn write_file(&self, path: &Path, sim: &Simulator) -> Result<(), OutputError> {
        let file = io::BufWriter::new(fs::File::create(path)?);
        let mut file = self.write(file, sim)?;
        file.flush()?;
        debug!("wrote animation for {} nodes to {}", sim.nodes().len(), path.display());
        Ok(())
    }

    pub fn write<W: Write>(&self, out: W, sim: &Simulator) -> Result<W, OutputError> {
        let mut writer = Writer::new_with_indent(out, b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
        let mut anim = BytesStart::new("anim");
        anim.push_attribute(("ver", "netanim-3.108"));
        anim.push_attribute(("filetype", "animation"));
        writer.write_event(Event::Start(anim))?;

        let mut topology = BytesStart::new("topology");
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for node in sim.nodes() {
            let p = node.position();
            bounds = Some(match bounds {
                Some((min_x, min_y, max_x, max_y)) => {
                    (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
                },
                None => (p.x, p.y, p.x, p.y),
            });
        }
        if let Some((min_x, min_y, max_x, max_y)) = bounds {
            topology.push_attribute(("minX", min_x.to_string().as_str()));
            topology.push_attribute(("minY", min_y.to_string().as_str()));
            topology.push_attribute(("maxX", max_x.to_string().as_str()));
            topology.push_attribute(("maxY", max_y.to_string().as_str()));
        }
        writer.write_event(Event::Start(topology))?;
        for node in sim.nodes() {
            let position = node.position();
            let mut elem = BytesStart::new("node");
            elem.push_attribute(("id", node.id().to_string().as_str()));
            elem.push_attribute(("sysId", "0"));
            elem.push_attribute(("locX", position.x.to_string().as_str()));
            elem.push_attribute(("locY", position.y.to_string().as_str()));
            writer.write_event(Event::Empty(elem))?;
        }
        for device in sim.devices() {
            let channel = match device.channel().and_then(|id| sim.channel(id)) {
                Some(channel) => channel,
                None => continue,
            };
            if channel.kind() != ChannelKind::PointToPoint && channel.kind() != ChannelKind::Radio {
                continue;
            }
            // one link per channel, written from its first device
            if channel.devices().first() != Some(&device.id()) {
                continue;
            }
            let peer = match channel.devices().get(1).and_then(|id| sim.device(*id).ok()) {
                Some(peer) => peer,
                None => continue,
            };
            let mut elem = BytesStart::new("link");
            elem.push_attribute(("fromId", device.node().to_string().as_str()));
            elem.push_attribute(("toId", peer.node().to_string().as_str()));
            writer.write_event(Event::Empty(elem))?;
        }
        writer.write_event(Event::End(BytesEnd::new("topology")))?;

        for (node, style) in &self.styles {
            let id = node.to_string();
            if let Some(description) = &style.description {
                let mut elem = update(&id, "d");
                elem.push_attribute(("descr", description.as_str()));
                writer.write_event(Event::Empty(elem))?;
            }
            if let Some(Rgb(r, g, b)) = style.color {
                let mut elem = update(&id, "c");
                elem.push_attribute(("r", r.to_string().as_str()));
                elem.push_attribute(("g", g.to_string().as_str()));
                elem.push_attribute(("b", b.to_string().as_str()));
                writer.write_event(Event::Empty(elem))?;
            }
            if let Some((w, h)) = style.size {
                let mut elem = update(&id, "s");
                elem.push_attribute(("w", w.to_string().as_str()));
                elem.push_attribute(("h", h.to_string().as_str()));
                writer.write_event(Event::Empty(elem))?;
            }
        }

        writer.write_event(Event::End(BytesEnd::new("anim")))?;
        let mut out = writer.into_inner();
        out.write_all(b"\n")?;
        Ok(out)
    }
}

fn update(id: &str, property: &str) -> BytesStart<'static> {
    let mut elem = BytesStart::new("nu");
    elem.push_attribute(("p", property));
    elem.push_attribute(("t", "0"));
    elem.push_attribute(("id", id));
    elem
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mobility::Position;
    use crate::sim::DataRate;

    #[test]
    fn writes_nodes_links_and_styles() {
        let mut sim = Simulator::new();
        let a = sim.add_node("a");
        let b = sim.add_node("b");
        sim.set_position(b, Position::new(20.0, 10.0, 0.0)).unwrap();
        sim.connect(a, b, ChannelKind::PointToPoint, DataRate::mbps(5), Duration::from_millis(2)).unwrap();

        let mut anim = AnimationInterface::new();
        anim.update_node_description(a, "UE");
        anim.update_node_color(a, 255, 0, 0);
        anim.update_node_size(b, 5000.0, 5000.0);

        let out = anim.write(Vec::new(), &sim).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(r#"<node id="1" sysId="0" locX="20" locY="10"/>"#));
        assert!(text.contains(r#"<link fromId="0" toId="1"/>"#));
        assert!(text.contains(r#"<nu p="d" t="0" id="0" descr="UE"/>"#));
        assert!(text.contains(r#"<nu p="c" t="0" id="0" r="255" g="0" b="0"/>"#));
        assert!(text.contains(r#"<nu p="s" t="0" id="1" w="5000" h="5000"/>"#));
    }
}
