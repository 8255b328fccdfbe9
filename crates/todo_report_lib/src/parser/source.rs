//! # Finding annotations in source code.
use super::{langs::Grammar, take_to_eol, Annotation, Kind};

use nom::{
    branch, bytes::complete as bytes, character::complete as character, combinator, sequence,
    IResult, Parser,
};

/// The body of one comment, without its delimiters.
#[derive(Clone, Debug, PartialEq)]
pub struct CommentRegion<'a> {
    pub body: &'a str,
    /// 1-based line the comment starts on.
    pub line: usize,
    pub is_block: bool,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_separator(c: char) -> bool {
    c == ':' || c.is_whitespace()
}

/// Eat an annotation keyword and its separator, returning the keyword's kind.
/// The keyword must be followed by a colon, whitespace or the end of input.
///
/// ```rust
/// use todo_report_lib::{parser::source::annotation_tag, Kind};
///
/// assert_eq!(annotation_tag("TODO: fix it"), Ok(("fix it", Kind::Todo)));
/// assert_eq!(annotation_tag("FIXME  :  later"), Ok(("later", Kind::Fixme)));
/// assert_eq!(annotation_tag("TODO"), Ok(("", Kind::Todo)));
/// assert!(annotation_tag("TODOIST is an app").is_err());
/// assert!(annotation_tag("todo: lower case").is_err());
/// ```
pub fn annotation_tag(i: &str) -> IResult<&str, Kind> {
    let (i, kind) = branch::alt((
        combinator::value(Kind::Todo, bytes::tag(Kind::Todo.keyword())),
        combinator::value(Kind::Fixme, bytes::tag(Kind::Fixme.keyword())),
    ))
    .parse(i)?;
    let (i, _) = combinator::not(character::satisfy(|c| !is_separator(c))).parse(i)?;
    let (i, _) = character::space0(i)?;
    let (i, _) = combinator::opt(character::char(':')).parse(i)?;
    let (i, _) = character::space0(i)?;
    Ok((i, kind))
}

/// Eat a comment that runs from `prefix` to the end of the line.
///
/// ```rust
/// use todo_report_lib::parser::source::line_comment;
///
/// assert_eq!(
///     line_comment("#")("# TODO: tidy\nx = 1"),
///     Ok(("x = 1", " TODO: tidy"))
/// );
/// ```
pub fn line_comment<'a>(prefix: &'a str) -> impl Fn(&'a str) -> IResult<&'a str, &'a str> {
    move |i| {
        let (i, _) = bytes::tag(prefix)(i)?;
        take_to_eol(i)
    }
}

/// Eat a comment between `start` and `end`. A comment that is never closed
/// runs to the end of the input.
///
/// ```rust
/// use todo_report_lib::parser::source::block_comment;
///
/// let parser = block_comment("/*", "*/");
/// assert_eq!(parser("/* a\n b */ c"), Ok((" c", " a\n b ")));
/// assert_eq!(parser("/* open"), Ok(("", " open")));
/// ```
pub fn block_comment<'a>(
    start: &'a str,
    end: &'a str,
) -> impl Fn(&'a str) -> IResult<&'a str, &'a str> {
    move |i| {
        let (i, _) = bytes::tag(start)(i)?;
        match bytes::take_until::<_, _, nom::error::Error<&str>>(end)(i) {
            Ok((j, body)) => {
                let (j, _) = bytes::tag(end)(j)?;
                Ok((j, body))
            }
            Err(_) => Ok(("", i)),
        }
    }
}

/// Eat a string literal opened by `quote`, honoring backslash escapes.
/// Unless `multiline` is set, a literal left open at the end of its line is
/// not a literal at all (think apostrophes in prose).
fn string_literal(quote: char, multiline: bool) -> impl Fn(&str) -> IResult<&str, &str> {
    move |i: &str| {
        let (rest, _) = character::char(quote)(i)?;
        let mut escaped = false;
        for (n, c) in rest.char_indices() {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                let end = n + c.len_utf8();
                return Ok((&rest[end..], &rest[..n]));
            } else if c == '\n' && !multiline {
                break;
            }
        }
        Err(nom::Err::Error(nom::error::Error::new(
            i,
            nom::error::ErrorKind::Char,
        )))
    }
}

/// Eat a string literal that opens and closes with `delim`, like Python's
/// `"""`. A literal that is never closed runs to the end of the input.
///
/// ```rust
/// use todo_report_lib::parser::source::long_string;
///
/// let parser = long_string("\"\"\"");
/// assert_eq!(parser("\"\"\"doc\n# x\"\"\" y"), Ok((" y", "doc\n# x")));
/// ```
pub fn long_string<'a>(delim: &'a str) -> impl Fn(&'a str) -> IResult<&'a str, &'a str> {
    block_comment(delim, delim)
}

/// Eat a char literal such as `'x'`, `'"'` or `'\u{1F600}'`. A `'` that does
/// not start one (a lifetime or a loop label) is left alone.
///
/// ```rust
/// use todo_report_lib::parser::source::char_literal;
///
/// assert_eq!(char_literal("'/' + 1"), Ok((" + 1", "/")));
/// assert_eq!(char_literal("'\\'' x"), Ok((" x", "\\'")));
/// assert!(char_literal("'a str").is_err());
/// assert!(char_literal("'static").is_err());
/// ```
pub fn char_literal(i: &str) -> IResult<&str, &str> {
    let escape = combinator::recognize((
        character::char('\\'),
        branch::alt((
            combinator::recognize((
                bytes::tag("u{"),
                character::hex_digit1,
                character::char('}'),
            )),
            combinator::recognize((character::char('x'), character::hex_digit1)),
            combinator::recognize(character::anychar),
        )),
    ));
    sequence::delimited(
        character::char('\''),
        branch::alt((escape, combinator::recognize(character::none_of("\\'\n")))),
        character::char('\''),
    )
    .parse(i)
}

/// Find every comment in `content`, in order.
pub fn comment_regions(grammar: Grammar, content: &str) -> Vec<CommentRegion<'_>> {
    let blocks = grammar
        .blocks()
        .iter()
        .map(|&(start, end)| block_comment(start, end))
        .collect::<Vec<_>>();
    let single = grammar.line_prefix().map(|prefix| line_comment(prefix));
    let long_strings = grammar
        .long_strings()
        .iter()
        .map(|&delim| long_string(delim))
        .collect::<Vec<_>>();
    let quotes = grammar.quotes();
    let chars = grammar.has_char_literals();

    let mut regions = vec![];
    let mut line = 1;
    let mut i = content;
    while let Some(c) = i.chars().next() {
        let start_line = line;
        let mut region = None;
        let mut rest = None;

        if let Some((j, body)) = blocks.iter().find_map(|parse| parse(i).ok()) {
            region = Some((body, true));
            rest = Some(j);
        } else if let Some(Ok((j, body))) = single.as_ref().map(|parse| parse(i)) {
            region = Some((body, false));
            rest = Some(j);
        } else if let Some((j, _)) = long_strings.iter().find_map(|parse| parse(i).ok()) {
            rest = Some(j);
        } else if chars && c == '\'' {
            rest = char_literal(i).ok().map(|(j, _)| j);
        } else if quotes.contains(&c) {
            let multiline = c == '`' || grammar == Grammar::Rust;
            rest = string_literal(c, multiline)(i).ok().map(|(j, _)| j);
        }

        let j = rest.unwrap_or(&i[c.len_utf8()..]);
        line += i[..i.len() - j.len()].matches('\n').count();
        i = j;

        if let Some((body, is_block)) = region {
            regions.push(CommentRegion {
                body,
                line: start_line,
                is_block,
            });
        }
    }
    regions
}

/// Trim whitespace and any leading or trailing border characters.
///
/// ```rust
/// use todo_report_lib::parser::source::trim_borders;
///
/// assert_eq!(trim_borders(&["*"], "  * and more lines *\n"), "and more lines");
/// ```
pub fn trim_borders<'a>(borders: &[&str], i: &'a str) -> &'a str {
    let i = i.trim();
    let i = borders
        .iter()
        .fold(i, |i, border| i.trim_start_matches(border).trim());
    borders
        .iter()
        .fold(i, |i, border| i.trim_end_matches(border).trim())
}

/// A keyword found in a comment body. Offsets index into `lines[line]`.
#[derive(Debug)]
struct Hit {
    kind: Kind,
    line: usize,
    start: usize,
    text_start: usize,
}

fn find_hits(lines: &[&str]) -> Vec<Hit> {
    let mut hits = vec![];
    for (line, text) in lines.iter().enumerate() {
        let mut prev: Option<char> = None;
        let mut skip_to = 0;
        for (start, c) in text.char_indices() {
            let at_boundary = !prev.map(is_ident_char).unwrap_or(false);
            prev = Some(c);
            if start < skip_to || !at_boundary {
                continue;
            }
            if let Ok((rest, kind)) = annotation_tag(&text[start..]) {
                let text_start = text.len() - rest.len();
                hits.push(Hit {
                    kind,
                    line,
                    start,
                    text_start,
                });
                skip_to = text_start;
            }
        }
    }
    hits
}

/// Find every annotation in one comment. Each keyword occurrence yields one
/// annotation whose text runs to the next occurrence or the end of the comment.
pub fn annotations_in_comment(
    grammar: Grammar,
    path: &str,
    region: &CommentRegion<'_>,
) -> Vec<Annotation> {
    let lines = region
        .body
        .split('\n')
        .map(|ln| ln.trim_end_matches('\r'))
        .collect::<Vec<_>>();
    let hits = find_hits(&lines);

    let mut annotations = vec![];
    for (n, hit) in hits.iter().enumerate() {
        let (end_line, end_col) = match hits.get(n + 1) {
            Some(next) => (next.line, next.start),
            None => (lines.len() - 1, lines[lines.len() - 1].len()),
        };

        let mut parts = vec![];
        for ln in hit.line..=end_line {
            let text = lines[ln];
            let from = if ln == hit.line { hit.text_start } else { 0 };
            let to = if ln == end_line { end_col } else { text.len() };
            let part = &text[from.min(to)..to];
            let part = if ln == hit.line {
                part.trim()
            } else {
                trim_borders(grammar.borders(), part)
            };
            if !part.is_empty() {
                parts.push(part);
            }
        }

        annotations.push(Annotation {
            kind: hit.kind,
            text: parts.join(" "),
            file_path: path.to_owned(),
            line: region.line + hit.line,
        });
    }
    annotations
}

/// Extract every annotation from one file's content, in discovery order.
///
/// ```rust
/// use todo_report_lib::{parser::{langs::Grammar, source::extract}, Kind};
///
/// let src = "let a = 1;\n\n// TODO: fix parser\n";
/// let found = extract("a.js", src, Grammar::CStyle);
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].kind, Kind::Todo);
/// assert_eq!(found[0].text, "fix parser");
/// assert_eq!(found[0].line, 3);
/// ```
pub fn extract(path: &str, content: &str, grammar: Grammar) -> Vec<Annotation> {
    comment_regions(grammar, content)
        .iter()
        .flat_map(|region| annotations_in_comment(grammar, path, region))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(found: &[Annotation]) -> Vec<(Kind, &str, usize)> {
        found
            .iter()
            .map(|a| (a.kind, a.text.as_str(), a.line))
            .collect()
    }

    #[test]
    fn hash_comment() {
        let src = "\n".repeat(9) + "# FIXME: handle edge case\nprint(1)\n";
        let found = extract("b.py", &src, Grammar::Hash);
        assert_eq!(texts(&found), vec![(Kind::Fixme, "handle edge case", 10)]);
        assert_eq!(found[0].file_path, "b.py");
    }

    #[test]
    fn trailing_comment_after_code() {
        let src = "const x = 1; // TODO make this configurable\n";
        let found = extract("a.js", src, Grammar::CStyle);
        assert_eq!(
            texts(&found),
            vec![(Kind::Todo, "make this configurable", 1)]
        );
    }

    #[test]
    fn keyword_must_be_a_whole_token() {
        let src = "// TODOIST: nope\n// MY_TODO: nope\n// FIXMEs nope\n// todo: nope\n";
        assert!(extract("a.js", src, Grammar::CStyle).is_empty());
    }

    #[test]
    fn keyword_outside_comments_is_ignored() {
        let src = "const TODO = 'TODO: not a comment';\nlet s = \"// TODO: in a string\";\n";
        assert!(extract("a.js", src, Grammar::CStyle).is_empty());
    }

    #[test]
    fn string_delimiters_do_not_hide_later_comments() {
        let src = "let url = \"http://example.com\"; // FIXME: use https\n";
        let found = extract("a.ts", src, Grammar::CStyle);
        assert_eq!(texts(&found), vec![(Kind::Fixme, "use https", 1)]);

        let src = "fn f<'a>(s: &'a str) {} // TODO: lifetimes\n";
        let found = extract("a.rs", src, Grammar::Rust);
        assert_eq!(texts(&found), vec![(Kind::Todo, "lifetimes", 1)]);
    }

    #[test]
    fn rust_lifetimes_and_chars_are_not_strings() {
        let src = "fn name(&self) -> &'static str { // TODO: can't borrow here\n\
                   }\n\
                   impl<'a> Foo<'a> {} // FIXME: don't leak\n\
                   let q = '\"'; // TODO: quote char\n\
                   let s = '/'; let e = '\\''; // FIXME: slash char\n\
                   'outer: loop { break 'outer; } // TODO: labels\n";
        let found = extract("lib.rs", src, Grammar::Rust);
        assert_eq!(
            texts(&found),
            vec![
                (Kind::Todo, "can't borrow here", 1),
                (Kind::Fixme, "don't leak", 3),
                (Kind::Todo, "quote char", 4),
                (Kind::Fixme, "slash char", 5),
                (Kind::Todo, "labels", 6),
            ]
        );
    }

    #[test]
    fn rust_strings_may_span_lines() {
        let src = "let s = \"first\n// TODO: not a comment\n\"; // FIXME: real\n";
        let found = extract("lib.rs", src, Grammar::Rust);
        assert_eq!(texts(&found), vec![(Kind::Fixme, "real", 3)]);
    }

    #[test]
    fn python_docstrings_are_strings() {
        let src = "def f():\n    \"\"\"Helper.\n\n    # TODO: not a comment\n    \"\"\"\n    \
                   return 1  # FIXME: real one\n\
                   x = '''# TODO: also not'''\n\
                   y = \"\"  # TODO: after empty string\n";
        let found = extract("a.py", src, Grammar::Python);
        assert_eq!(
            texts(&found),
            vec![
                (Kind::Fixme, "real one", 6),
                (Kind::Todo, "after empty string", 8),
            ]
        );
    }

    #[test]
    fn handlebars_short_and_long_comments() {
        let src = "{{! TODO: short form }}\n<p>{{name}}</p>\n{{!-- FIXME: long }} form --}}\n";
        let found = extract("a.hbs", src, Grammar::Handlebars);
        assert_eq!(
            texts(&found),
            vec![(Kind::Todo, "short form", 1), (Kind::Fixme, "long }} form", 3)]
        );
    }

    #[test]
    fn block_comment_spans_lines() {
        let src = "x();\n/**\n * TODO: split this\n *   into two passes\n */\ny();\n";
        let found = extract("a.c", src, Grammar::CStyle);
        assert_eq!(
            texts(&found),
            vec![(Kind::Todo, "split this into two passes", 3)]
        );
    }

    #[test]
    fn many_keywords_in_one_block() {
        let src = "/* TODO: first\n   FIXME: second */\n";
        let found = extract("a.css", src, Grammar::Css);
        assert_eq!(
            texts(&found),
            vec![(Kind::Todo, "first", 1), (Kind::Fixme, "second", 2)]
        );

        let src = "// TODO: one FIXME: two\n";
        let found = extract("a.js", src, Grammar::CStyle);
        assert_eq!(
            texts(&found),
            vec![(Kind::Todo, "one", 1), (Kind::Fixme, "two", 1)]
        );
    }

    #[test]
    fn bare_keyword_has_empty_text() {
        let found = extract("a.sql", "select 1; -- TODO\n", Grammar::DoubleDash);
        assert_eq!(texts(&found), vec![(Kind::Todo, "", 1)]);
    }

    #[test]
    fn unterminated_block_runs_to_end() {
        let src = "a\n<!-- FIXME: close this\n";
        let found = extract("index.html", src, Grammar::Markup);
        assert_eq!(texts(&found), vec![(Kind::Fixme, "close this", 2)]);
    }

    #[test]
    fn block_delimiters_win_over_line_prefix() {
        let src = "--[[\nTODO: lua block\n]]\n-- FIXME: lua line\n";
        let found = extract("a.lua", src, Grammar::Lua);
        assert_eq!(
            texts(&found),
            vec![(Kind::Todo, "lua block", 2), (Kind::Fixme, "lua line", 4)]
        );

        let src = "{- | TODO: draw an owl -}\nmain = pure ()\n";
        let found = extract("Main.hs", src, Grammar::Haskell);
        assert_eq!(texts(&found), vec![(Kind::Todo, "draw an owl", 1)]);
    }

    #[test]
    fn crlf_line_numbers() {
        let src = "a\r\nb\r\n# TODO: windows\r\n";
        let found = extract("a.sh", src, Grammar::Hash);
        assert_eq!(texts(&found), vec![(Kind::Todo, "windows", 3)]);
    }

    #[test]
    fn no_comments_no_annotations() {
        assert!(extract("a.js", "let a = 1;\nlet b = 2;\n", Grammar::CStyle).is_empty());
        assert!(extract("a.js", "", Grammar::CStyle).is_empty());
    }

    #[test]
    fn regions_are_found_in_order() {
        let src = "/* one */ // two\n# not a comment\n";
        let regions = comment_regions(Grammar::CStyle, src);
        assert_eq!(
            regions,
            vec![
                CommentRegion {
                    body: " one ",
                    line: 1,
                    is_block: true
                },
                CommentRegion {
                    body: " two",
                    line: 1,
                    is_block: false
                },
            ]
        );
    }
}
