use std::cell::RefCell;
use std::io::{BufRead, Write};
use vpurge_core::cancel::CancelToken;
use vpurge_core::engine::PurgePlan;
use vpurge_core::gate::ConfirmationGate;

/// Asks the operator to review a plan before anything is deleted.
///
/// Offers three trust levels: compare the resolved keepers with the
/// configured allow-list, review the delete list, or proceed blindly.
/// End of input counts as "no".
pub struct InteractiveGate<R, W> {
    io: RefCell<(R, W)>,
    cancel: Option<CancelToken>,
}

impl InteractiveGate<std::io::StdinLock<'static>, std::io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> InteractiveGate<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            io: RefCell::new((input, output)),
            cancel: None,
        }
    }

    /// Decline as soon as `cancel` trips, whatever the operator answers.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.io.into_inner().1
    }

    fn review(&self, plan: &PurgePlan) -> std::io::Result<bool> {
        let mut guard = self.io.borrow_mut();
        let (input, out) = &mut *guard;
        let kind = plan.kind;
        let rule = "-------------------------------";

        loop {
            writeln!(out, "1. Check marked persistent {kind} against what was found.")?;
            writeln!(out, "2. Check what is marked for deletion.")?;
            writeln!(out, "3. Trust the process and move forward.")?;
            let Some(choice) = prompt(input, out, "- ")? else {
                return Ok(false);
            };
            if self.cancelled() {
                return Ok(false);
            }

            let question = match choice.as_str() {
                "1" => {
                    writeln!(out, "{rule}")?;
                    writeln!(out, "Please check that the two lists match:")?;
                    writeln!(out, "{}", plan.keep_names().join(", "))?;
                    writeln!(out, "vs")?;
                    let mut configured: Vec<&str> =
                        plan.allow.names.iter().map(String::as_str).collect();
                    configured.extend(plan.allow.ids.iter().map(String::as_str));
                    writeln!(out, "{}", configured.join(", "))?;
                    writeln!(out, "{rule}")?;
                    "Do they match?(y/n) "
                }
                "2" => {
                    writeln!(out, "{rule}")?;
                    writeln!(out, "Here are the {kind} being purged:")?;
                    writeln!(out, "{}", plan.delete_names().join(", "))?;
                    writeln!(out, "{rule}")?;
                    "Is this list accurate?(y/n) "
                }
                "3" => return Ok(true),
                _ => continue,
            };

            loop {
                let Some(answer) = prompt(input, out, question)? else {
                    return Ok(false);
                };
                if self.cancelled() {
                    return Ok(false);
                }
                match answer.to_lowercase().as_str() {
                    "y" => return Ok(true),
                    "n" => {
                        writeln!(out, "Please check the input values. Exiting...")?;
                        return Ok(false);
                    }
                    _ => writeln!(out, "Invalid input. Please enter 'y' or 'n'.")?,
                }
            }
        }
    }
}

fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    text: &str,
) -> std::io::Result<Option<String>> {
    write!(out, "{text}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

impl<R: BufRead, W: Write> ConfirmationGate for InteractiveGate<R, W> {
    fn confirm(&self, plan: &PurgePlan) -> bool {
        match self.review(plan) {
            Ok(go) => go,
            Err(e) => {
                tracing::warn!("confirmation prompt failed: {e}");
                false
            }
        }
    }
}
