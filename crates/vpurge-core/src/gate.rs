use crate::engine::PurgePlan;

/// Go/no-go decision taken after the plan is computed and before anything
/// is deleted. The engine never prompts on its own; the CLI supplies an
/// interactive implementation.
pub trait ConfirmationGate {
    fn confirm(&self, plan: &PurgePlan) -> bool;
}

/// Proceed without review (`--yes`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl ConfirmationGate for AutoApprove {
    fn confirm(&self, _plan: &PurgePlan) -> bool {
        true
    }
}

/// Never proceed. Used for dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decline;

impl ConfirmationGate for Decline {
    fn confirm(&self, _plan: &PurgePlan) -> bool {
        false
    }
}

impl<F> ConfirmationGate for F
where
    F: Fn(&PurgePlan) -> bool,
{
    fn confirm(&self, plan: &PurgePlan) -> bool {
        self(plan)
    }
}
