//! Interactive confirmation

use dialoguer::Confirm;
use rotor_core::service::{Confirmation, ServiceResult};

/// Asks the operator on the terminal
///
/// Blocks the whole process until an answer is given. Fails when stdin is
/// not a terminal; pass `--prompt false` for unattended runs.
#[derive(Debug, Default)]
pub struct TerminalConfirmation;

impl Confirmation for TerminalConfirmation {
    fn confirm(&self, question: &str, default: bool) -> ServiceResult<bool> {
        println!();
        let answer = Confirm::new()
            .with_prompt(question)
            .default(default)
            .interact()?;
        println!();
        Ok(answer)
    }
}
