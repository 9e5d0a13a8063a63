use crate::{dialect::Dialect, error::DataAccessError};
use thiserror::Error as ThisError;

///
/// Segment
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Segment {
    Text(String),
    /// Index into the owning method's parameter list.
    Arg(usize),
}

///
/// TemplateError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum TemplateError {
    #[error("placeholder '{{{name}}}' does not match any parameter")]
    UnresolvedPlaceholder { name: String },
}

///
/// SqlTemplate
///
/// Literal SQL split around `{identifier}` placeholders. Rendering replaces
/// each placeholder with as many positional markers as its argument holds.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SqlTemplate {
    segments: Vec<Segment>,
    arity: usize,
}

impl SqlTemplate {
    /// Split `sql` around placeholders naming one of `params`.
    ///
    /// Braces that do not enclose an identifier are kept as text.
    pub fn parse(sql: &str, params: &[&str]) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut rest = sql;

        while let Some(open) = rest.find('{') {
            text.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let name = after
                .find('}')
                .map(|close| &after[..close])
                .filter(|name| is_identifier(name));

            let Some(name) = name else {
                text.push('{');
                rest = after;
                continue;
            };

            let arg = params
                .iter()
                .position(|param| *param == name)
                .ok_or_else(|| TemplateError::UnresolvedPlaceholder {
                    name: name.to_string(),
                })?;

            if !text.is_empty() {
                segments.push(Segment::Text(std::mem::take(&mut text)));
            }
            segments.push(Segment::Arg(arg));
            rest = &after[name.len() + 1..];
        }

        text.push_str(rest);
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Ok(Self {
            segments,
            arity: params.len(),
        })
    }

    #[must_use]
    pub const fn from_segments(segments: Vec<Segment>, arity: usize) -> Self {
        Self { segments, arity }
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of parameters the template was parsed against.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.arity
    }

    /// Argument indices in placeholder order, repeats included.
    pub fn placeholder_order(&self) -> impl Iterator<Item = usize> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Arg(arg) => Some(*arg),
            Segment::Text(_) => None,
        })
    }

    /// Render with `counts[arg]` markers per placeholder.
    pub fn render(&self, counts: &[usize], dialect: &dyn Dialect) -> Result<String, DataAccessError> {
        if counts.len() != self.arity {
            return Err(DataAccessError::query_invariant(format!(
                "template expects {} argument counts, got {}",
                self.arity,
                counts.len()
            )));
        }

        let mut sql = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => sql.push_str(text),
                Segment::Arg(arg) => {
                    let count = counts.get(*arg).copied().ok_or_else(|| {
                        DataAccessError::query_invariant(format!("placeholder argument {arg} out of range"))
                    })?;
                    sql.push_str(&dialect.placeholders(count));
                }
            }
        }

        Ok(sql)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();

    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
