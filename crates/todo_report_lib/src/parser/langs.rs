//! # Comment grammars and the extensions that use them.
use std::{collections::HashMap, path::Path, sync::LazyLock};

/// The extension assumed for files that have none.
pub const DEFAULT_EXTENSION: &str = ".js";

/// A family of comment syntax shared by one or more languages.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Grammar {
    /// `//` and `/* */`
    CStyle,
    /// `//` and `/* */`, where `'` only opens char literals
    Rust,
    /// `/* */` only
    Css,
    /// `#`
    Hash,
    /// `#`, with `"""` and `'''` strings
    Python,
    /// `#` and `=begin`/`=end`
    Ruby,
    /// `#` and `###`/`###`
    Coffee,
    /// `--`
    DoubleDash,
    /// `--` and `{-`/`-}`
    Haskell,
    /// `--` and `--[[`/`]]`
    Lua,
    /// `<!--`/`-->` only
    Markup,
    /// `//`
    Jade,
    /// `{{!--`/`--}}` and `{{!`/`}}` only
    Handlebars,
}

impl Grammar {
    /// The prefix that starts a comment running to the end of the line.
    pub fn line_prefix(&self) -> Option<&'static str> {
        match self {
            Grammar::CStyle | Grammar::Rust | Grammar::Jade => Some("//"),
            Grammar::Hash | Grammar::Python | Grammar::Ruby | Grammar::Coffee => Some("#"),
            Grammar::DoubleDash | Grammar::Haskell | Grammar::Lua => Some("--"),
            Grammar::Css | Grammar::Markup | Grammar::Handlebars => None,
        }
    }

    /// The start and end delimiters of block comments, longest start first.
    pub fn blocks(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Grammar::CStyle | Grammar::Rust | Grammar::Css => &[("/*", "*/")],
            Grammar::Ruby => &[("=begin", "=end")],
            Grammar::Coffee => &[("###", "###")],
            Grammar::Haskell => &[("{-", "-}")],
            Grammar::Lua => &[("--[[", "]]")],
            Grammar::Markup => &[("<!--", "-->")],
            Grammar::Handlebars => &[("{{!--", "--}}"), ("{{!", "}}")],
            Grammar::Hash | Grammar::Python | Grammar::DoubleDash | Grammar::Jade => &[],
        }
    }

    /// Ignorable outline characters at the start of block comment lines.
    /// Eg. "*" for C-like langs.
    pub fn borders(&self) -> &'static [&'static str] {
        match self {
            Grammar::CStyle | Grammar::Rust | Grammar::Css => &["*"],
            Grammar::Haskell => &["|"],
            _ => &[],
        }
    }

    /// Characters that open a string literal, inside which comment delimiters
    /// are ignored.
    pub fn quotes(&self) -> &'static [char] {
        match self {
            Grammar::CStyle => &['"', '\'', '`'],
            Grammar::Css
            | Grammar::Hash
            | Grammar::Python
            | Grammar::Ruby
            | Grammar::Coffee
            | Grammar::Lua => &['"', '\''],
            Grammar::DoubleDash => &['\''],
            Grammar::Rust | Grammar::Haskell | Grammar::Jade => &['"'],
            Grammar::Markup | Grammar::Handlebars => &[],
        }
    }

    /// Delimiters of string literals that may span lines. These are tried
    /// before [`Grammar::quotes`].
    pub fn long_strings(&self) -> &'static [&'static str] {
        match self {
            Grammar::Python => &["\"\"\"", "'''"],
            _ => &[],
        }
    }

    /// Whether `'` opens a char literal like `'x'` or `'\n'` rather than a
    /// string. A lone `'` (a lifetime or label) is plain code.
    pub fn has_char_literals(&self) -> bool {
        matches!(self, Grammar::Rust)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupportedLanguage {
    pub name: &'static str,
    pub grammar: Grammar,
    pub file_extensions: Vec<&'static str>,
}

pub fn lang(name: &'static str, grammar: Grammar, exts: Vec<&'static str>) -> SupportedLanguage {
    SupportedLanguage {
        name,
        grammar,
        file_extensions: exts,
    }
}

pub fn all_supported_langs() -> Vec<SupportedLanguage> {
    vec![
        lang("C, C++, C#", Grammar::CStyle, vec!["c", "h", "cc", "cpp", "hpp", "cs"]),
        lang("CoffeeScript", Grammar::Coffee, vec!["coffee"]),
        lang("CSS", Grammar::Css, vec!["css"]),
        lang("Go", Grammar::CStyle, vec!["go"]),
        lang("Groovy", Grammar::CStyle, vec!["groovy"]),
        lang("Handlebars", Grammar::Handlebars, vec!["hbs", "handlebars"]),
        lang("Haskell, Elm, Purescript", Grammar::Haskell, vec!["hs", "elm", "purs"]),
        lang("HTML, XML", Grammar::Markup, vec!["html", "htm", "xml", "svg"]),
        lang("Jade", Grammar::Jade, vec!["jade", "pug"]),
        lang("Java", Grammar::CStyle, vec!["java"]),
        lang(
            "JavaScript",
            Grammar::CStyle,
            vec!["js", "jsx", "mjs", "cjs", "es6"],
        ),
        lang("Kotlin", Grammar::CStyle, vec!["kt"]),
        lang("Less, Sass, Stylus", Grammar::CStyle, vec!["less", "scss", "styl"]),
        lang("Lua", Grammar::Lua, vec!["lua"]),
        lang("Make, CMake", Grammar::Hash, vec!["mk", "cmake"]),
        lang("Markdown", Grammar::Markup, vec!["md", "markdown"]),
        lang("Nix", Grammar::Hash, vec!["nix"]),
        lang("Perl", Grammar::Hash, vec!["pl", "pm"]),
        lang("PHP", Grammar::CStyle, vec!["php"]),
        lang("Python", Grammar::Python, vec!["py"]),
        lang("R", Grammar::Hash, vec!["r"]),
        lang("Ruby", Grammar::Ruby, vec!["rb"]),
        lang("Rust", Grammar::Rust, vec!["rs"]),
        lang("Scala", Grammar::CStyle, vec!["scala"]),
        lang("Shell", Grammar::Hash, vec!["sh", "bash", "zsh", "dockerfile"]),
        lang("Sql", Grammar::DoubleDash, vec!["sql"]),
        lang("Swift", Grammar::CStyle, vec!["swift"]),
        lang("Terraform", Grammar::Hash, vec!["tf"]),
        lang("TOML", Grammar::Hash, vec!["toml"]),
        lang("Typescript", Grammar::CStyle, vec!["ts", "tsx"]),
        lang("Vue component", Grammar::CStyle, vec!["vue"]),
        lang("YAML", Grammar::Hash, vec!["yaml", "yml"]),
    ]
}

/// Normalize an extension to its lower-cased, dotted form, falling back to
/// [`DEFAULT_EXTENSION`] when there is none.
///
/// ```rust
/// use todo_report_lib::parser::langs::normalize_extension;
///
/// assert_eq!(normalize_extension("JS"), ".js");
/// assert_eq!(normalize_extension(".Py"), ".py");
/// assert_eq!(normalize_extension(""), ".js");
/// ```
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim_start_matches('.');
    if ext.is_empty() {
        DEFAULT_EXTENSION.to_owned()
    } else {
        format!(".{}", ext.to_lowercase())
    }
}

/// The normalized extension of a path.
///
/// ```rust
/// use todo_report_lib::parser::langs::extension_of;
///
/// assert_eq!(extension_of("src/lib/Parser.TS"), ".ts");
/// assert_eq!(extension_of("bin/cli"), ".js");
/// ```
pub fn extension_of(path: impl AsRef<Path>) -> String {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    normalize_extension(ext)
}

/// Maps normalized extensions to their comment grammar.
#[derive(Clone, Debug)]
pub struct GrammarRegistry {
    by_ext: HashMap<String, Grammar>,
}

static REGISTRY: LazyLock<GrammarRegistry> =
    LazyLock::new(|| GrammarRegistry::from_langs(all_supported_langs()));

impl GrammarRegistry {
    pub fn from_langs(langs: Vec<SupportedLanguage>) -> Self {
        let mut by_ext = HashMap::new();
        for language in langs.into_iter() {
            for ext in language.file_extensions.iter() {
                by_ext.insert(normalize_extension(ext), language.grammar);
            }
        }
        GrammarRegistry { by_ext }
    }

    /// The registry of every built-in language.
    pub fn global() -> &'static GrammarRegistry {
        &REGISTRY
    }

    /// Look up the grammar for an extension. The lookup is exact after
    /// normalization.
    pub fn resolve(&self, ext: &str) -> Option<Grammar> {
        self.by_ext.get(&normalize_extension(ext)).copied()
    }

    pub fn supports(&self, ext: &str) -> bool {
        self.resolve(ext).is_some()
    }
}
