//! The single pass that turns shorthand scenario text into Ren'Py script.
//!
//! One `Compiler` handles exactly one compilation unit: it walks the
//! input lines once, appending to its output buffer as it goes, and is
//! consumed by `compile`. `$include` spins up a fresh instance for the
//! included file, so nothing that file defines survives past its own
//! compile.
//
//  Notation excerpts (informal):
//
//      ;;name            label definition        →  label name:
//      「text。」          narrator line           →  "text。"
//      A「text」          dialogue line           →  "A" "「text」"   (alias-resolved)
//      ;alias:display    alias definition        (no output)
//      #comment          kept verbatim
//      :raw              already Ren'Py, kept at column 0
//      %in%…             one extra indent level per repeat
//      $command args…    extension instruction
//
//  Extension instructions: python/endpy, renpy/endrenpy, inpy/endinpy,
//  include, deco/enddeco, define, ifdef/ifndef/endif.

use std::collections::HashMap;

use super::Compiled;
use super::error::{CompileError, Warning};
use super::files::FileAccess;
use super::text::{Decoration, apply_effects};

/// Four spaces per level, as Ren'Py convention has it.
const INDENT_UNIT: &str = "    ";

/// Indent units a line gets when the current mode does not dictate one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Indent {
    None = 0,
    /// Inside the enclosing label – where say statements live.
    Default = 1,
    /// Body of a `python:` block that is itself inside a label.
    Python = 2,
}

/// Scanning regime for incoming lines. Everything outside `Scenario` is
/// a verbatim pass-through that only watches for its own end marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Interpret every directive and dialogue construct.
    Scenario,
    /// `$renpy` … `$endrenpy` – raw Ren'Py at column 0.
    Renpy,
    /// `$python` … `$endpy` – file-level `python:` block, body one level in.
    Python,
    /// `$inpy` … `$endinpy` – `python:` block nested in a label, body two
    /// levels in.
    InnerPython,
}

pub(super) struct Compiler<'a> {
    files: Option<&'a dyn FileAccess>,
    output: String,
    /// 1-based count of emitted output lines, for diagnostics only.
    line_count: usize,
    /// Indent boost from `%in%` prefixes; spent on the next emission.
    extra_indent: usize,
    mode: Mode,
    aliases: HashMap<String, String>,
    decorations: Vec<Decoration>,
    /// A vec, not a map: substitutions apply in definition order.
    substitutions: Vec<(String, String)>,
    /// Nesting depth of false conditional blocks being skipped.
    skip_depth: usize,
    warnings: Vec<Warning>,
}

impl<'a> Compiler<'a> {
    pub(super) fn new(files: Option<&'a dyn FileAccess>) -> Self {
        Self {
            files,
            output: String::new(),
            line_count: 1,
            extra_indent: 0,
            mode: Mode::Scenario,
            aliases: HashMap::new(),
            decorations: Vec::new(),
            substitutions: Vec::new(),
            skip_depth: 0,
            warnings: Vec::new(),
        }
    }

    pub(super) fn compile(mut self, source: &str) -> Result<Compiled, CompileError> {
        for line in source.split('\n') {
            self.scan(line)?;
        }
        Ok(Compiled {
            text: self.output,
            warnings: self.warnings,
        })
    }

    /// Append one output line: `INDENT_UNIT × (level + extra_indent)`,
    /// the text, a newline. The current mode overrides the caller's
    /// level, empty text forces level 0, and `extra_indent` is spent
    /// either way.
    fn put(&mut self, text: &str, level: Indent) {
        let level = match self.mode {
            Mode::Renpy => Indent::None,
            Mode::Python => Indent::Default,
            Mode::InnerPython => Indent::Python,
            Mode::Scenario => level,
        };
        let level = if text.is_empty() { Indent::None } else { level };
        for _ in 0..level as usize + self.extra_indent {
            self.output.push_str(INDENT_UNIT);
        }
        self.output.push_str(text);
        self.output.push('\n');
        self.line_count += 1;
        self.extra_indent = 0;
    }

    /// Consume a source line without visible output, still advancing the
    /// diagnostic line counter.
    fn put_blank(&mut self) {
        self.put("", Indent::None);
    }

    fn scan(&mut self, line: &str) -> Result<(), CompileError> {
        // False-conditional gate, ahead of everything else: every line
        // goes out blank until the matching `$endif`. Inner conditionals
        // deepen the count; nothing else in here is even looked at.
        if self.skip_depth > 0 {
            match line.split(' ').next() {
                Some("$ifdef") | Some("$ifndef") => self.skip_depth += 1,
                _ if line == "$endif" => self.skip_depth -= 1,
                _ => {}
            }
            self.put_blank();
            return Ok(());
        }

        match self.mode {
            Mode::Renpy => {
                if line == "$endrenpy" {
                    self.mode = Mode::Scenario;
                    self.put_blank();
                } else {
                    self.put(line, Indent::Default);
                }
                Ok(())
            }
            Mode::Python => {
                if line == "$endpy" {
                    self.mode = Mode::Scenario;
                    self.put_blank();
                } else {
                    self.put(line, Indent::Default);
                }
                Ok(())
            }
            Mode::InnerPython => {
                if line == "$endinpy" {
                    self.mode = Mode::Scenario;
                    self.put_blank();
                } else {
                    self.put(line, Indent::Default);
                }
                Ok(())
            }
            Mode::Scenario => self.scan_scenario(line),
        }
    }

    /// Classify one line in scenario mode, first prefix match wins.
    fn scan_scenario(&mut self, line: &str) -> Result<(), CompileError> {
        if line.is_empty() {
            self.put_blank();
            return Ok(());
        }

        let mut line = line;
        while let Some(rest) = line.strip_prefix("%in%") {
            self.extra_indent += 1;
            line = rest;
        }

        if let Some(name) = line.strip_prefix(";;") {
            // entry points always sit at column 0
            self.put(&format!("label {name}:"), Indent::None);
        } else if line.starts_with('#') {
            // Ren'Py comments out with `#` too, keep the whole line
            self.put(line, Indent::Default);
        } else if line.contains('「') {
            self.say(line)?;
        } else if let Some(rest) = line.strip_prefix(';') {
            self.alias(rest)?;
        } else if let Some(rest) = line.strip_prefix(':') {
            // escape hatch: the rest is already Ren'Py
            self.put(rest, Indent::None);
        } else if let Some(rest) = line.strip_prefix('$') {
            self.instruction(rest)?;
        } else {
            return Err(CompileError::Syntax {
                line: self.line_count,
            });
        }
        Ok(())
    }

    /// Dialogue line – narrator form if it opens with `「`, otherwise
    /// `speaker「message」` with alias resolution on the speaker.
    fn say(&mut self, line: &str) -> Result<(), CompileError> {
        if !line.contains('」') {
            return Err(CompileError::UnclosedDialogue {
                line: self.line_count,
            });
        }

        if let Some(inner) = line.strip_prefix('「') {
            let message = drop_last_char(inner);
            if !message.ends_with('。') {
                self.warnings.push(Warning {
                    line: self.line_count,
                    message: "narration does not end with a full stop".into(),
                });
            }
            let text = self.effects(message);
            self.put(&format!("\"{text}\""), Indent::Default);
        } else {
            let head = drop_last_char(line);
            let (speaker, message) = head.split_once('「').unwrap_or((head, ""));
            let text = self.effects(message);
            let statement = match self.aliases.get(speaker) {
                Some(display) => format!("{display} \"「{text}」\""),
                None => format!("\"{speaker}\" \"「{text}」\""),
            };
            self.put(&statement, Indent::Default);
        }
        Ok(())
    }

    /// `;alias:display` – any further `:`-separated fields are dropped.
    fn alias(&mut self, rest: &str) -> Result<(), CompileError> {
        let mut fields = rest.split(':');
        let alias = fields.next().unwrap_or("");
        let display = fields.next().ok_or(CompileError::MalformedAlias {
            line: self.line_count,
        })?;
        self.aliases.insert(alias.to_string(), display.to_string());
        self.put_blank();
        Ok(())
    }

    /// `$command args…` – the extension instruction table.
    fn instruction(&mut self, rest: &str) -> Result<(), CompileError> {
        let mut words = rest.split(' ');
        let command = words.next().unwrap_or("");
        let args: Vec<&str> = words.collect();

        match command {
            "python" => {
                self.put("python:", Indent::None);
                self.mode = Mode::Python;
            }
            "renpy" => {
                self.mode = Mode::Renpy;
                self.put_blank();
            }
            "inpy" => {
                self.put("python:", Indent::Default);
                self.mode = Mode::InnerPython;
            }
            "include" => return self.include(&args),
            "deco" => {
                if args.is_empty() {
                    return Err(self.argument_count("deco", 1, 0));
                }
                for name in &args {
                    match Decoration::from_name(name) {
                        Some(deco) => self.decorations.push(deco),
                        None => {
                            return Err(CompileError::UnknownDecoration {
                                line: self.line_count,
                                name: name.to_string(),
                            });
                        }
                    }
                }
                self.put_blank();
            }
            "enddeco" => {
                self.decorations.clear();
                self.put_blank();
            }
            "define" => {
                if args.len() != 2 {
                    return Err(self.argument_count("define", 2, args.len()));
                }
                self.define(args[0], args[1]);
                self.put_blank();
            }
            "ifdef" => {
                if args.len() != 1 {
                    return Err(self.argument_count("ifdef", 1, args.len()));
                }
                if !self.defined(args[0]) {
                    self.skip_depth += 1;
                }
                self.put_blank();
            }
            "ifndef" => {
                if args.len() != 1 {
                    return Err(self.argument_count("ifndef", 1, args.len()));
                }
                if self.defined(args[0]) {
                    self.skip_depth += 1;
                }
                self.put_blank();
            }
            // a satisfied conditional runs into its own `$endif` here;
            // an unmatched one is tolerated the same way
            "endif" => {
                self.skip_depth = self.skip_depth.saturating_sub(1);
                self.put_blank();
            }
            _ => {
                return Err(CompileError::UnknownInstruction {
                    line: self.line_count,
                    command: command.to_string(),
                });
            }
        }
        Ok(())
    }

    /// `$include path` – compile the file with a fresh engine and splice
    /// the whole result in as a single verbatim emission.
    fn include(&mut self, args: &[&str]) -> Result<(), CompileError> {
        let Some(files) = self.files else {
            return Err(CompileError::IncludeUnavailable {
                line: self.line_count,
            });
        };
        if args.len() != 1 {
            return Err(self.argument_count("include", 1, args.len()));
        }
        let path = args[0];
        if !files.exists(path) {
            return Err(CompileError::IncludeNotFound {
                line: self.line_count,
                path: path.to_string(),
            });
        }
        let source = files
            .read_all(path)
            .map_err(|source| CompileError::IncludeRead {
                line: self.line_count,
                path: path.to_string(),
                source,
            })?;

        let inner = Compiler::new(Some(files)).compile(&source)?;
        self.warnings.extend(inner.warnings);
        self.put(&inner.text, Indent::None);
        Ok(())
    }

    fn effects(&self, message: &str) -> String {
        apply_effects(message, &self.decorations, &self.substitutions)
    }

    /// Redefinition keeps the token's position in the application order.
    fn define(&mut self, token: &str, replacement: &str) {
        match self
            .substitutions
            .iter()
            .position(|(t, _)| t.as_str() == token)
        {
            Some(i) => self.substitutions[i].1 = replacement.to_string(),
            None => self
                .substitutions
                .push((token.to_string(), replacement.to_string())),
        }
    }

    fn defined(&self, token: &str) -> bool {
        self.substitutions.iter().any(|(t, _)| t.as_str() == token)
    }

    fn argument_count(&self, command: &'static str, expected: usize, found: usize) -> CompileError {
        CompileError::ArgumentCount {
            line: self.line_count,
            command,
            expected,
            found,
        }
    }
}

/// The notation drops a dialogue line's final character before splitting,
/// whatever it is; in well-formed input that is the closing `」`.
fn drop_last_char(s: &str) -> &str {
    let mut chars = s.chars();
    chars.next_back();
    chars.as_str()
}

#[cfg(test)]
mod tests {
    use crate::compiler::{CompileError, compile};

    /// Compile without file access and unwrap the produced text.
    fn text(src: &str) -> String {
        compile(src, None).expect("should compile").text
    }

    #[test]
    fn test_blank_lines_only() {
        // one blank emission per input line, nothing else
        let test_cases = vec![("", "\n"), ("\n", "\n\n"), ("\n\n\n", "\n\n\n\n")];

        for (src, expected) in test_cases {
            assert_eq!(text(src), expected);
        }
    }

    #[test]
    fn test_basic_lines() {
        let test_cases = vec![
            (";;start", "label start:\n"),
            ("「こんにちは。」", "    \"こんにちは。\"\n"),
            ("A「元気？」", "    \"A\" \"「元気？」\"\n"),
            ("# a note", "    # a note\n"),
            (":show eileen happy", "show eileen happy\n"),
            (";Bob:Robert", "\n"),
        ];

        for (src, expected) in test_cases {
            assert_eq!(text(src), expected, "src {src:?}");
        }
    }

    #[test]
    fn test_alias_resolution() {
        let out = text(";Bob:Robert\nBob「Hi」");
        assert_eq!(out, "\n    Robert \"「Hi」\"\n");
    }

    #[test]
    fn test_alias_uses_latest_definition() {
        let out = text(";B:Beth\n;B:Bella\nB「や」");
        assert_eq!(out, "\n\n    Bella \"「や」\"\n");
    }

    #[test]
    fn test_alias_extra_fields_dropped() {
        let out = text(";a:b:c\na「x」");
        assert_eq!(out, "\n    b \"「x」\"\n");
    }

    #[test]
    fn test_narrator_warning() {
        let compiled = compile("「やあ」", None).unwrap();
        assert_eq!(compiled.text, "    \"やあ\"\n");
        assert_eq!(compiled.warnings.len(), 1);
        assert_eq!(compiled.warnings[0].line, 1);

        let quiet = compile("「やあ。」", None).unwrap();
        assert!(quiet.warnings.is_empty());
    }

    #[test]
    fn test_extra_indent_prefix() {
        let test_cases = vec![
            ("%in%「はい。」", "        \"はい。\"\n"),
            ("%in%%in%:pass", "        pass\n"),
            // the boost never carries over to the following line
            ("%in%:pass\n:pass", "    pass\npass\n"),
        ];

        for (src, expected) in test_cases {
            assert_eq!(text(src), expected, "src {src:?}");
        }
    }

    #[test]
    fn test_python_block() {
        let out = text("$python\nx = 1\n$endpy");
        assert_eq!(out, "python:\n    x = 1\n\n");
    }

    #[test]
    fn test_renpy_block() {
        let out = text("$renpy\nshow eileen happy\n$endrenpy");
        assert_eq!(out, "\nshow eileen happy\n\n");
    }

    #[test]
    fn test_inner_python_block() {
        let out = text(";;start\n$inpy\nx = 1\n$endinpy");
        assert_eq!(out, "label start:\n    python:\n        x = 1\n\n");
    }

    #[test]
    fn test_verbatim_mode_ignores_directives() {
        // everything short of the exact end marker passes through,
        // directives and broken dialogue included
        let out = text("$renpy\n;;label\n$define A B\nA「oops\n$endrenpy");
        assert_eq!(out, "\n;;label\n$define A B\nA「oops\n\n");
    }

    #[test]
    fn test_blank_line_inside_block_stays_flat() {
        let out = text("$python\n\nx = 1\n$endpy");
        assert_eq!(out, "python:\n\n    x = 1\n\n");
    }

    #[test]
    fn test_decorations_wrap_in_push_order() {
        let out = text("$deco b i\nA「Hi」");
        assert_eq!(out, "\n    \"A\" \"「{i}{b}Hi{/b}{/i}」\"\n");
    }

    #[test]
    fn test_decorations_apply_to_narration() {
        let out = text("$deco u\n「さて。」");
        assert_eq!(out, "\n    \"{u}さて。{/u}\"\n");
    }

    #[test]
    fn test_enddeco_clears_the_whole_stack() {
        let out = text("$deco b i u\n$enddeco\nA「Hi」");
        assert_eq!(out, "\n\n    \"A\" \"「Hi」\"\n");
    }

    #[test]
    fn test_define_substitutes_in_dialogue() {
        let out = text("$define HELLO Konnichiwa\nA「HELLO」");
        assert_eq!(out, "\n    \"A\" \"「Konnichiwa」\"\n");
    }

    #[test]
    fn test_redefine_updates_in_place() {
        let out = text("$define X a\n$define X b\nA「X」");
        assert_eq!(out, "\n\n    \"A\" \"「b」\"\n");
    }

    #[test]
    fn test_ifdef_skips_when_undefined() {
        // `not a line!` would be a syntax error if it were interpreted
        let out = text("$ifdef X\nnot a line!\n「skipped」\n$endif\n;;after");
        assert_eq!(out, "\n\n\n\nlabel after:\n");
    }

    #[test]
    fn test_ifdef_keeps_body_when_defined() {
        let out = text("$define X 1\n$ifdef X\n「あ。」\n$endif");
        assert_eq!(out, "\n\n    \"あ。\"\n\n");
    }

    #[test]
    fn test_ifndef_is_the_inverse() {
        let out = text("$ifndef X\n「あ。」\n$endif");
        assert_eq!(out, "\n    \"あ。\"\n\n");

        let skipped = text("$define X 1\n$ifndef X\n「あ。」\n$endif");
        assert_eq!(skipped, "\n\n\n\n");
    }

    #[test]
    fn test_nested_conditionals_count_depth() {
        // the inner $ifdef deepens the skip, so the first $endif does
        // not end it
        let out = text("$ifdef X\n$ifdef Y\n$endif\nstill skipped!\n$endif\n;;after");
        assert_eq!(out, "\n\n\n\n\nlabel after:\n");
    }

    #[test]
    fn test_skip_counter_is_permissive() {
        // a stray $endif is a harmless blank, not an error – the counter
        // is not validated against its openers
        let out = text("$endif\n;;after");
        assert_eq!(out, "\nlabel after:\n");

        // mode end markers mean nothing to the gate
        let gated = text("$ifdef X\n$endrenpy\n$endif\n;;after");
        assert_eq!(gated, "\n\n\nlabel after:\n");
    }

    #[test]
    fn test_skipped_conditional_never_changes_mode() {
        // $renpy inside a skipped block must not start a verbatim block
        let out = text("$ifdef X\n$renpy\n$endif\n;;after");
        assert_eq!(out, "\n\n\nlabel after:\n");
    }

    #[test]
    fn test_line_numbers_in_errors() {
        // counter counts emitted lines, so the failing line is 1-based
        let err = compile("「あ。」\nnope", None).unwrap_err();
        match err {
            CompileError::Syntax { line } => assert_eq!(line, 2),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_error_cases() {
        let test_cases = vec![
            ("nope", "line 1: unrecognized line"),
            ("A「open", "line 1: dialogue is never closed"),
            (";BobRobert", "line 1: alias definition is missing `:`"),
            ("$frobnicate", "line 1: unknown instruction `$frobnicate`"),
            ("$deco", "line 1: `$deco` takes 1 argument(s), got 0"),
            ("$deco blink", "line 1: unknown decoration `blink`"),
            ("$define X", "line 1: `$define` takes 2 argument(s), got 1"),
            (
                "$define X a b",
                "line 1: `$define` takes 2 argument(s), got 3",
            ),
            ("$ifdef", "line 1: `$ifdef` takes 1 argument(s), got 0"),
            ("$ifndef a b", "line 1: `$ifndef` takes 1 argument(s), got 2"),
            (
                "$include",
                "line 1: `$include` needs file access, which is unavailable here",
            ),
        ];

        for (src, expected) in test_cases {
            let err = compile(src, None).unwrap_err();
            assert_eq!(err.to_string(), expected, "src {src:?}");
        }
    }

    #[test]
    fn test_fail_fast_stops_emitting() {
        // no partial output is observable, the compile returns Err only
        assert!(compile(";;ok\nnope\n;;never", None).is_err());
    }
}
