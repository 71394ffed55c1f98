//! The parsed form of a schedule file.

use std::fmt;

use indexmap::IndexMap;
use spire_core::Span;

/// One `world[:alternate]` entry of a choice.
#[derive(Debug, Clone, Eq)]
pub struct Selection {
    pub world: String,
    /// Alternate implementation name; `None` accepts the unnamed one.
    pub alternate: Option<String>,
    /// Where the selection was written, for diagnostics.
    pub span: Span,
}

impl Selection {
    pub fn new(world: impl Into<String>, alternate: Option<String>) -> Self {
        Self {
            world: world.into(),
            alternate,
            span: Span::default(),
        }
    }

    /// The alternate name, with the unnamed implementation as `""`.
    pub fn alternate_name(&self) -> &str {
        self.alternate.as_deref().unwrap_or("")
    }
}

// Positions are bookkeeping; two selections naming the same world and
// alternate are the same selection.
impl PartialEq for Selection {
    fn eq(&self, other: &Self) -> bool {
        self.world == other.world && self.alternate == other.alternate
    }
}

impl std::hash::Hash for Selection {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.world.hash(state);
        self.alternate.hash(state);
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alternate {
            Some(alternate) => write!(f, "{}:{}", self.world, alternate),
            None => write!(f, "{}", self.world),
        }
    }
}

/// Developer overrides for one compile: chosen placements and extra attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    /// Choice name to its selections, in file order.
    pub choices: IndexMap<String, Vec<Selection>>,
    /// Choice name to attribute overrides.
    pub attributes: IndexMap<String, IndexMap<String, String>>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty() && self.attributes.is_empty()
    }

    /// Append a selection to a choice, creating the choice if needed.
    pub fn add_selection(&mut self, choice: impl Into<String>, selection: Selection) {
        self.choices
            .entry(choice.into())
            .or_default()
            .push(selection);
    }

    /// Set an attribute override, replacing any earlier value for the key.
    pub fn set_attribute(
        &mut self,
        choice: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.attributes
            .entry(choice.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    pub fn choice(&self, name: &str) -> Option<&[Selection]> {
        self.choices.get(name).map(Vec::as_slice)
    }
}

/// Writes schedule syntax that [`crate::parse`] reads back.
///
/// A choice with no selections has no syntax (`name = ;` does not parse)
/// and is left out, so it is absent from the re-parsed schedule.
impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, selections) in &self.choices {
            if selections.is_empty() {
                continue;
            }
            write!(f, "{} = ", name)?;
            for (i, selection) in selections.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", selection)?;
            }
            writeln!(f, ";")?;
        }
        for (name, attributes) in &self.attributes {
            write!(f, "attrib {}(", name)?;
            for (i, (key, value)) in attributes.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} = \"{}\"", key, escape(value))?;
            }
            writeln!(f, ");")?;
        }
        Ok(())
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selections_ignore_position() {
        let mut a = Selection::new("fs", Some("phong".into()));
        let b = Selection::new("fs", Some("phong".into()));
        a.span = Span::new(3, 9, 8);
        assert_eq!(a, b);
        assert_ne!(a, Selection::new("fs", None));
        assert_eq!(Selection::new("vs", None).alternate_name(), "");
    }

    #[test]
    fn display_writes_choices_then_attributes() {
        let mut schedule = Schedule::new();
        schedule.add_selection("light.model", Selection::new("fs", Some("phong".into())));
        schedule.add_selection("light.model", Selection::new("vs", None));
        schedule.set_attribute("light.model", "label", "say \"hi\"");

        assert_eq!(
            schedule.to_string(),
            "light.model = fs:phong, vs;\nattrib light.model(label = \"say \\\"hi\\\"\");\n"
        );
    }

    #[test]
    fn display_skips_choices_without_selections() {
        let mut schedule = Schedule::new();
        schedule.choices.insert("unused".into(), Vec::new());
        schedule.add_selection("albedo", Selection::new("fs", None));
        assert_eq!(schedule.to_string(), "albedo = fs;\n");
    }
}
