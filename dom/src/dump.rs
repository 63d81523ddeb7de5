use std::fmt::Write;

use crate::node::{CharacterDataVariant, Node, NodeData};

/// How [`Node::dump`] renders a subtree. The default is plain text with
/// surrounding whitespace trimmed from character data.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DumpSettings {
    /// Wrap names and values in ANSI colors.
    pub color: bool,
    /// Print character data as stored instead of trimmed.
    pub raw_text: bool,
}

impl DumpSettings {
    fn paint(&self, code: &'static str) -> &'static str {
        match self.color {
            true => code,
            false => "",
        }
    }
}

impl Node<'_> {
    pub fn dump(&self, settings: DumpSettings) {
        print!("{}", self.dump_to_string(settings));
    }

    /// One line per node in tree order, two spaces of indentation per level.
    pub fn dump_to_string(&self, settings: DumpSettings) -> String {
        let mut output = String::new();
        self.dump_line(&mut output, 0, &settings);
        output
    }

    fn dump_line(&self, output: &mut String, depth: usize, settings: &DumpSettings) {
        let name = settings.paint("\x1b[33m");
        let key = settings.paint("\x1b[34m");
        let value = settings.paint("\x1b[37m");
        let muted = settings.paint("\x1b[90m");
        let reset = settings.paint("\x1b[0m");

        let _ = write!(output, "{:width$}", "", width = depth * 2);
        let _ = match &self.data {
            NodeData::Doctype { name: doctype, .. } => {
                write!(output, "{name}DOCTYPE {value}{doctype}{reset}")
            }
            NodeData::CharacterData { data, variant } => {
                let data = data.borrow();
                let text = match settings.raw_text {
                    true => data.as_str(),
                    false => data.trim(),
                };
                match variant {
                    CharacterDataVariant::ProcessingInstruction { target } => {
                        write!(output, "{muted}<?{target} {value}{text}{muted}?>{reset}")
                    }
                    _ => write!(output, "{muted}{}: \"{value}{text}{muted}\"{reset}", self.node_name()),
                }
            }
            NodeData::Element { name: element, attributes } => {
                let _ = write!(output, "{name}{}", element.local);
                for attribute in attributes.borrow().iter() {
                    let _ = write!(
                        output,
                        " {key}{}{muted}=\"{value}{}{muted}\"",
                        attribute.name.local, attribute.value
                    );
                }
                write!(output, "{reset}")
            }
            _ => write!(output, "{muted}{}{reset}", self.node_name()),
        };
        output.push('\n');

        for child in self.children() {
            child.dump_line(output, depth + 1, settings);
        }
    }
}
