//! The fixed provisioning step sequence.
//!
//! Each step has a progress weight (the percentage reported when the step
//! starts), a human-readable label, and a failure class. The table is the
//! single source of truth for all three.

/// Whether a step's failure ends the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criticality {
    /// Failure aborts the run and produces an `error` outcome.
    Critical,
    /// Failure is logged and the run continues.
    BestEffort,
}

/// Identifies one step of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepId {
    Initialize,
    CreateRepository,
    AwaitMaterialization,
    CreateEnvironments,
    RepositorySecrets,
    EnvironmentSecrets,
    CustomizeReadme,
    SetupIssue,
    ImportWorkflow,
    InviteCollaborator,
}

impl StepId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::CreateRepository => "create_repository",
            Self::AwaitMaterialization => "await_materialization",
            Self::CreateEnvironments => "create_environments",
            Self::RepositorySecrets => "repository_secrets",
            Self::EnvironmentSecrets => "environment_secrets",
            Self::CustomizeReadme => "customize_readme",
            Self::SetupIssue => "setup_issue",
            Self::ImportWorkflow => "import_workflow",
            Self::InviteCollaborator => "invite_collaborator",
        }
    }

    pub fn spec(self) -> &'static StepSpec {
        // Every variant appears exactly once in STEPS, in declaration order.
        &STEPS[self as usize]
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a step.
#[derive(Debug)]
pub struct StepSpec {
    pub id: StepId,

    /// Progress percentage published when the step starts, or `None` for
    /// steps that run under the previous step's progress.
    pub weight: Option<u8>,

    pub label: &'static str,
    pub criticality: Criticality,
}

pub static STEPS: [StepSpec; 10] = [
    StepSpec {
        id: StepId::Initialize,
        weight: Some(0),
        label: "Initializing...",
        criticality: Criticality::Critical,
    },
    StepSpec {
        id: StepId::CreateRepository,
        weight: Some(20),
        label: "Creating repository from template...",
        criticality: Criticality::Critical,
    },
    StepSpec {
        id: StepId::AwaitMaterialization,
        weight: None,
        label: "Waiting for template contents...",
        criticality: Criticality::Critical,
    },
    StepSpec {
        id: StepId::CreateEnvironments,
        weight: Some(40),
        label: "Creating GitHub Environments...",
        criticality: Criticality::Critical,
    },
    StepSpec {
        id: StepId::RepositorySecrets,
        weight: Some(50),
        label: "Adding repository secrets...",
        criticality: Criticality::Critical,
    },
    StepSpec {
        id: StepId::EnvironmentSecrets,
        weight: Some(60),
        label: "Configuring Okta secrets...",
        criticality: Criticality::Critical,
    },
    StepSpec {
        id: StepId::CustomizeReadme,
        weight: Some(75),
        label: "Customizing repository...",
        criticality: Criticality::BestEffort,
    },
    // Best-effort, like the README step: a repository without its setup
    // issue is still fully usable.
    StepSpec {
        id: StepId::SetupIssue,
        weight: Some(85),
        label: "Creating setup instructions...",
        criticality: Criticality::BestEffort,
    },
    StepSpec {
        id: StepId::ImportWorkflow,
        weight: Some(90),
        label: "Triggering initial import...",
        criticality: Criticality::BestEffort,
    },
    StepSpec {
        id: StepId::InviteCollaborator,
        weight: Some(95),
        label: "Adding collaborator...",
        criticality: Criticality::BestEffort,
    },
];

/// Deployment environments created in every repository, in creation order.
/// Okta secrets go into the first one.
pub const DEPLOYMENT_ENVIRONMENTS: [&str; 4] = ["shared", "production", "staging", "development"];

#[cfg(test)]
#[path = "steps_tests.rs"]
mod tests;
