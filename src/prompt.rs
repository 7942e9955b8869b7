use std::io::{BufRead, Write};

/// Blocking questions asked to the user in the middle of an action.
pub trait Prompt {
    /// Free text answer, `None` when the user gives nothing.
    fn prompt(&mut self, message: &str) -> Option<String>;
    fn confirm(&mut self, message: &str) -> bool;
    fn alert(&mut self, message: &str);
}

/// Asks on stdout and reads answers from stdin.
pub struct Terminal;

impl Terminal {
    fn read_line(&self) -> Option<String> {
        std::io::stdout().flush().unwrap_or_default();
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_owned()),
        }
    }
}

impl Prompt for Terminal {
    fn prompt(&mut self, message: &str) -> Option<String> {
        print!("{} ", message);
        self.read_line().filter(|answer| !answer.is_empty())
    }

    fn confirm(&mut self, message: &str) -> bool {
        println!("{}", message);
        loop {
            print!("input [y, n]: ");
            match self.read_line().as_deref() {
                Some("y") | Some("yes") => return true,
                Some("n") | Some("no") | Some("") | None => return false,
                Some(_) => continue,
            }
        }
    }

    fn alert(&mut self, message: &str) {
        println!("! {}", message);
    }
}

/// Answers every confirmation with yes, for `--yes` on the command line.
pub struct AssumeYes;

impl Prompt for AssumeYes {
    fn prompt(&mut self, _message: &str) -> Option<String> {
        None
    }

    fn confirm(&mut self, _message: &str) -> bool {
        true
    }

    fn alert(&mut self, message: &str) {
        println!("! {}", message);
    }
}
