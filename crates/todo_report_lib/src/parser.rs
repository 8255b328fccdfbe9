use nom::{bytes::complete as bytes, character::complete as character, combinator, IResult, Parser};

pub mod langs;
pub mod source;

/// Eat a whole line and optionally its ending but don't return that ending.
pub fn take_to_eol(i: &str) -> IResult<&str, &str> {
    let (i, ln) = bytes::take_till(|c| c == '\r' || c == '\n')(i)?;
    let (i, _) = combinator::opt(character::line_ending).parse(i)?;
    Ok((i, ln))
}

/// The keyword that marks a comment as an annotation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Todo,
    Fixme,
}

impl Kind {
    /// Every recognized keyword, in matching order.
    pub const ALL: [Kind; 2] = [Kind::Todo, Kind::Fixme];

    /// The exact, case-sensitive token for this keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            Kind::Todo => "TODO",
            Kind::Fixme => "FIXME",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One marked comment found in a source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    pub kind: Kind,
    /// Everything after the keyword and its separator, trimmed.
    pub text: String,
    /// The path of the file as it was handed to the pipeline.
    pub file_path: String,
    /// 1-based line of the keyword.
    pub line: usize,
}
