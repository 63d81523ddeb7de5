use crate::node::{CharacterDataVariant, Node, NodeData};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "xmp", "plaintext"];

impl Node<'_> {
    /// Serializes this node as markup. Documents and fragments serialize
    /// only their children.
    // SPECLINK: https://html.spec.whatwg.org/multipage/parsing.html#serialising-html-fragments
    pub fn to_html(&self) -> String {
        let mut output = String::new();
        match self.data {
            NodeData::Document | NodeData::DocumentFragment => self.write_children(&mut output),
            _ => self.write_markup(&mut output),
        }
        output
    }

    fn write_children(&self, output: &mut String) {
        for child in self.children() {
            child.write_markup(output);
        }
    }

    fn write_markup(&self, output: &mut String) {
        match &self.data {
            NodeData::Document | NodeData::DocumentFragment => self.write_children(output),
            NodeData::Element { name, attributes } => {
                output.push('<');
                output.push_str(&name.local);
                for attribute in attributes.borrow().iter() {
                    output.push(' ');
                    output.push_str(&attribute.name.local);
                    output.push_str("=\"");
                    output.push_str(&escape(&attribute.value, true));
                    output.push('"');
                }
                output.push('>');

                if VOID_ELEMENTS.contains(&name.local.as_str()) {
                    return;
                }
                self.write_children(output);
                output.push_str("</");
                output.push_str(&name.local);
                output.push('>');
            }
            NodeData::Doctype { name, .. } => {
                output.push_str("<!DOCTYPE ");
                output.push_str(name);
                output.push('>');
            }
            NodeData::CharacterData { data, variant } => {
                let data = data.borrow();
                match variant {
                    CharacterDataVariant::Text => {
                        let raw = self
                            .parent()
                            .is_some_and(|parent| parent.is_element_with_one_of_tags(RAW_TEXT_ELEMENTS));
                        match raw {
                            true => output.push_str(&data),
                            false => output.push_str(&escape(&data, false)),
                        }
                    }
                    CharacterDataVariant::CDataSection => {
                        output.push_str("<![CDATA[");
                        output.push_str(&data);
                        output.push_str("]]>");
                    }
                    CharacterDataVariant::Comment => {
                        output.push_str("<!--");
                        output.push_str(&data);
                        output.push_str("-->");
                    }
                    CharacterDataVariant::ProcessingInstruction { target } => {
                        output.push_str("<?");
                        output.push_str(target);
                        output.push(' ');
                        output.push_str(&data);
                        output.push('>');
                    }
                }
            }
            NodeData::Attr { .. } | NodeData::Entity { .. } | NodeData::Notation { .. } => {
                self.write_children(output)
            }
        }
    }
}

// SPECLINK: https://html.spec.whatwg.org/multipage/parsing.html#escapingString
fn escape(value: &str, attribute_mode: bool) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '\u{00A0}' => escaped.push_str("&nbsp;"),
            '"' if attribute_mode => escaped.push_str("&quot;"),
            '<' if !attribute_mode => escaped.push_str("&lt;"),
            '>' if !attribute_mode => escaped.push_str("&gt;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use typed_arena::Arena;

    use crate::node::Node;

    #[test]
    fn serializes_elements_and_text() {
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let p = document.create_element("p");
        p.set_attribute("title", "a \"quote\"");
        p.append_child(document.create_text_node("1 < 2 & 3")).unwrap();
        p.append_child(document.create_element("br")).unwrap();
        p.append_child(document.create_comment(" note ")).unwrap();

        assert_eq!(
            p.to_html(),
            "<p title=\"a &quot;quote&quot;\">1 &lt; 2 &amp; 3<br><!-- note --></p>"
        );
    }

    #[test]
    fn fragments_serialize_children_only() {
        let arena = Arena::new();
        let document = Node::new_document(&arena);
        let fragment = document.create_document_fragment();
        let b = document.create_element("b");
        b.append_child(document.create_text_node("bold")).unwrap();
        fragment.append_child(b).unwrap();
        fragment.append_child(document.create_text_node(" ")).unwrap();

        assert_eq!(fragment.to_html(), "<b>bold</b> ");
    }
}
