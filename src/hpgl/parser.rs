use super::commands::{self, CommandContext, ReplySink};
use super::types::{ParserState, Sheet};
use crate::bytecode::Bytecode;
use crate::error::PlotResult;

/// Tokenizer position between characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Token {
    #[default]
    SeekFirstCmdByte,
    SeekSecondCmdByte(u8),
    AccumulatingLabelArgs,
    AccumulatingArgs,
}

/// Streaming HP-GL tokenizer.
///
/// Chunks may split a command anywhere; the pending mnemonic and its partial arguments
/// are carried to the next `feed`.
#[derive(Debug, Clone, Default)]
pub struct ParserSession {
    token: Token,
    command: [u8; 2],
    args: String,
    pub state: ParserState,
}

impl ParserSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget any partially received command and all modal state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Parse one chunk, compiling every command it completes.
    ///
    /// Returns the pen-parked flag as of the last command completed in this chunk, or
    /// `false` when the chunk completed none.
    pub fn feed(
        &mut self,
        chunk: &str,
        code: &mut Bytecode,
        sheet: &Sheet,
        replies: &mut dyn ReplySink,
    ) -> PlotResult<bool> {
        let mut parked = false;
        let mut chars = chunk.chars().peekable();

        while let Some(&c) = chars.peek() {
            match self.token {
                Token::SeekFirstCmdByte => {
                    if c.is_ascii_uppercase() {
                        self.token = Token::SeekSecondCmdByte(c as u8);
                    }
                    chars.next();
                }
                Token::SeekSecondCmdByte(first) => {
                    if c.is_ascii_uppercase() {
                        self.command = [first, c as u8];
                        self.token = if &self.command == b"LB" {
                            Token::AccumulatingLabelArgs
                        } else {
                            Token::AccumulatingArgs
                        };
                    } else {
                        self.token = Token::SeekFirstCmdByte;
                    }
                    chars.next();
                }
                Token::AccumulatingLabelArgs => {
                    chars.next();
                    if c == self.state.label_terminator {
                        parked = self.dispatch(code, sheet, replies)?;
                    } else {
                        self.args.push(c);
                    }
                }
                Token::AccumulatingArgs => {
                    if c.is_ascii_uppercase() {
                        // Start of the next command: left for SeekFirstCmdByte.
                        parked = self.dispatch(code, sheet, replies)?;
                    } else if c == ';' {
                        chars.next();
                        parked = self.dispatch(code, sheet, replies)?;
                    } else {
                        self.args.push(c);
                        chars.next();
                    }
                }
            }
        }
        Ok(parked)
    }

    fn dispatch(
        &mut self,
        code: &mut Bytecode,
        sheet: &Sheet,
        replies: &mut dyn ReplySink,
    ) -> PlotResult<bool> {
        let args = std::mem::take(&mut self.args);
        self.token = Token::SeekFirstCmdByte;
        let mut ctx = CommandContext {
            state: &mut self.state,
            code,
            sheet,
            replies,
        };
        commands::dispatch(self.command, &args, &mut ctx)?;
        Ok(self.state.pen_parked)
    }

    /// True while a command has been started but not yet terminated
    pub fn has_pending_command(&self) -> bool {
        self.token != Token::SeekFirstCmdByte
    }
}
