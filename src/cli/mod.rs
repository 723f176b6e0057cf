use std::io::{BufRead, Write};

use crate::{
    core::{ErrorKind, SQLError},
    sql::{
        session::{QueryResult, SQLKind},
        Session,
    },
};

const PROMPT: &str = "spjql> ";

/// Line-oriented front end: one statement per line.
pub struct CliApp<I: BufRead, O: Write> {
    session: Session,

    input: I,
    output: O,
}

fn io_error(e: std::io::Error) -> SQLError {
    SQLError::new(ErrorKind::RuntimeError, format!("io error: {}", e))
}

impl<I: BufRead, O: Write> CliApp<I, O> {
    pub fn new(session: Session, input: I, output: O) -> Self {
        Self {
            session,
            input,
            output,
        }
    }

    /// Run until end of input. Returns the first fatal error, after which
    /// the session must not be used anymore.
    pub fn run(&mut self) -> Result<(), SQLError> {
        self.bootstrap()?;

        let mut line_buf = String::new();
        loop {
            self.prompt()?;
            line_buf.clear();
            if self.input.read_line(&mut line_buf).map_err(io_error)? == 0 {
                return Ok(());
            }

            let line = line_buf.trim();
            if line.is_empty() {
                continue;
            }

            match self.session.execute(line) {
                Ok(result) => {
                    let rendered = Self::render(&result);
                    self.print(&rendered)?;
                }
                Err(e) => {
                    self.print(&format!("Error: {}\n", e))?;
                    if e.is_fatal() {
                        return Err(e);
                    }
                }
            }
        }
    }

    /// Give the session back once the loop is over.
    pub fn into_session(self) -> Session {
        self.session
    }

    fn render(result: &QueryResult) -> String {
        match result.kind {
            SQLKind::Query => {
                let mut rendered = result.columns.join("\t");
                rendered.push('\n');
                for row in result.rows.iter() {
                    rendered.push_str(&row.to_string());
                    rendered.push('\n');
                }
                rendered.push_str(&format!("({} rows)\n", result.rows.len()));
                rendered
            }
            SQLKind::Execute if result.affected_rows > 0 => {
                format!("OK, {} row(s) affected\n", result.affected_rows)
            }
            SQLKind::Execute => "OK\n".to_string(),
        }
    }

    fn bootstrap(&mut self) -> Result<(), SQLError> {
        self.print("Welcome to spjql!\n")
    }

    fn prompt(&mut self) -> Result<(), SQLError> {
        self.print(PROMPT)
    }

    fn print(&mut self, string: &str) -> Result<(), SQLError> {
        self.output.write_all(string.as_bytes()).map_err(io_error)?;
        self.output.flush().map_err(io_error)
    }
}
