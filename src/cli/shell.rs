use std::{
    borrow::Cow,
    fmt,
    io::{self, BufRead},
};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};

use crate::cli::context::{CliMode, CommandError, LoopControl, ShellContext};
use crate::cli::output;
use crate::errors::CliError;

/// Any value switches the shell to reading commands from stdin.
pub const SCRIPT_ENV_VAR: &str = "TRAINER_CORE_CLI_SCRIPT";

/// Arguments offered by the completer after these commands.
const ARGUMENT_WORDS: &[(&str, &[&str])] = &[
    ("auto", &["on", "off"]),
    ("restore", &["--yes"]),
    ("import", &["--yes"]),
];

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV_VAR).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;
    match mode {
        CliMode::Interactive => {
            context.spawn_auto_backup();
            output::info("Type `help` to list commands.");
            let mut source = EditorSource::new(context.command_names())?;
            run_loop(&mut context, &mut source)
        }
        CliMode::Script => run_loop(&mut context, &mut StdinSource::default()),
    }
}

enum Input {
    Line(String),
    Interrupted,
    End,
}

trait LineSource {
    fn next(&mut self, prompt: &str) -> Result<Input, CliError>;
}

#[derive(Default)]
struct StdinSource {
    buffer: String,
}

impl LineSource for StdinSource {
    fn next(&mut self, _prompt: &str) -> Result<Input, CliError> {
        self.buffer.clear();
        if io::stdin().lock().read_line(&mut self.buffer)? == 0 {
            return Ok(Input::End);
        }
        let line = self.buffer.trim_end_matches(|c: char| c == '\r' || c == '\n');
        Ok(Input::Line(line.to_string()))
    }
}

struct EditorSource {
    editor: Editor<CommandHelper, DefaultHistory>,
}

impl EditorSource {
    fn new(words: Vec<&'static str>) -> Result<Self, CliError> {
        let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
        editor.set_helper(Some(CommandHelper::new(words)));
        editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
        Ok(Self { editor })
    }
}

impl LineSource for EditorSource {
    fn next(&mut self, prompt: &str) -> Result<Input, CliError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.trim()).ok();
                }
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::End),
            Err(err) => Err(err.into()),
        }
    }
}

fn run_loop(context: &mut ShellContext, source: &mut dyn LineSource) -> Result<(), CliError> {
    while context.running {
        match source.next(&context.prompt())? {
            Input::Line(line) => match handle_line(context, &line) {
                Ok(LoopControl::Continue) => {}
                Ok(LoopControl::Exit) => break,
                Err(err) => context.report_error(err)?,
            },
            Input::Interrupted => {
                if context.confirm_exit()? {
                    break;
                }
            }
            Input::End => {
                if context.mode == CliMode::Interactive {
                    output::info("Exiting shell.");
                }
                break;
            }
        }
    }
    Ok(())
}

fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    let tokens = match parse_command_line(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(err);
            return Ok(LoopControl::Continue);
        }
    };

    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    context.last_command = Some(line.trim().to_string());

    let control = context.dispatch(&raw.to_lowercase(), raw, &args)?;
    if control == LoopControl::Exit {
        context.running = false;
    }
    Ok(control)
}

struct CommandHelper {
    commands: Vec<String>,
}

impl CommandHelper {
    fn new(words: Vec<&'static str>) -> Self {
        let mut commands: Vec<String> = words.into_iter().map(str::to_string).collect();
        commands.sort();
        commands.dedup();
        Self { commands }
    }

    fn candidates<'a>(&'a self, line: &str, word: &str) -> Vec<&'a str> {
        let first = line
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let completing_command = !line.trim_start().contains(char::is_whitespace);

        if completing_command || first == "help" {
            return self
                .commands
                .iter()
                .map(String::as_str)
                .filter(|name| name.starts_with(word))
                .collect();
        }
        ARGUMENT_WORDS
            .iter()
            .find(|(command, _)| *command == first)
            .map(|(_, options)| {
                options
                    .iter()
                    .copied()
                    .filter(|option| option.starts_with(word))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        let start = prefix
            .rfind(char::is_whitespace)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let word = prefix[start..].to_ascii_lowercase();
        let pairs = self
            .candidates(prefix, &word)
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.to_string(),
                replacement: candidate.to_string(),
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;
}

impl Highlighter for CommandHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for CommandHelper {}

pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, ParseError> {
    shell_words::split(input).map_err(|err| ParseError(err.to_string()))
}

#[derive(Debug)]
pub(crate) struct ParseError(String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not parse command line: {}", self.0)
    }
}
