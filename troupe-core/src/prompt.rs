//! Structured prompt sections.
//!
//! Model-facing text in this workspace (speaker selection, participant
//! system prompts, composition requests) is assembled from named sections
//! rendered as markdown headers, so the model sees a stable, greppable
//! layout instead of ad hoc string concatenation.

/// A named block of prompt text: optional body, optional bullet list,
/// optional nested sub-sections.
#[derive(Debug, Clone, Default)]
pub struct Section {
    name: String,
    text: Option<String>,
    items: Vec<String>,
    children: Vec<Section>,
}

impl Section {
    /// Create an empty section with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the section body text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append one bullet item.
    pub fn item(mut self, item: impl Into<String>) -> Self {
        self.items.push(item.into());
        self
    }

    /// Append several bullet items.
    pub fn items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.extend(items.into_iter().map(Into::into));
        self
    }

    /// Append a nested sub-section (rendered one header level deeper).
    pub fn child(mut self, child: Section) -> Self {
        self.children.push(child);
        self
    }

    /// Render this section at the top header level.
    pub fn render(&self) -> String {
        self.render_at(1)
    }

    fn render_at(&self, level: usize) -> String {
        let mut out = format!("{} {}", "#".repeat(level), self.name.to_uppercase());

        if let Some(text) = &self.text {
            out.push('\n');
            out.push_str(text);
        }

        for item in &self.items {
            out.push_str("\n- ");
            out.push_str(item);
        }

        for child in &self.children {
            out.push_str("\n\n");
            out.push_str(&child.render_at(level + 1));
        }

        out
    }
}

/// Render a sequence of sections separated by blank lines.
pub fn render_sections(sections: &[Section]) -> String {
    sections
        .iter()
        .map(Section::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_name_text_and_items() {
        let section = Section::new("Mission")
            .text("Select the next speaker.")
            .item("Only pick a participant.");
        assert_eq!(
            section.render(),
            "# MISSION\nSelect the next speaker.\n- Only pick a participant."
        );
    }

    #[test]
    fn nested_sections_deepen_headers() {
        let section = Section::new("Chat").child(Section::new("Goal").text("Ship it."));
        assert_eq!(section.render(), "# CHAT\n\n## GOAL\nShip it.");
    }

    #[test]
    fn sections_joined_by_blank_lines() {
        let rendered = render_sections(&[Section::new("A"), Section::new("B")]);
        assert_eq!(rendered, "# A\n\n# B");
    }
}
