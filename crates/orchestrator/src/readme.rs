//! Template README placeholder substitution.

use provisioning::naming::sanitize;

/// Path of the customized file, relative to the repository root.
pub const README_PATH: &str = "README.md";

const SLUG_PLACEHOLDER: &str = "demo-myorg";
const ORG_PLACEHOLDER: &str = "MyOrg";
const TEMPLATE_NAME: &str = "okta-terraform-demo-template";

/// Replaces the template's org-specific placeholders.
pub fn customize(content: &str, org_name: &str, repository_name: &str) -> String {
    content
        .replace(SLUG_PLACEHOLDER, &sanitize(org_name))
        .replace(ORG_PLACEHOLDER, org_name)
        .replace(TEMPLATE_NAME, repository_name)
}

pub fn commit_message(org_name: &str) -> String {
    format!("chore: Customize README for {org_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customize_replaces_all_placeholders() {
        let template = "# okta-terraform-demo-template\n\
                        Welcome MyOrg! Tenant dir: environments/demo-myorg.\n\
                        MyOrg again.";

        let out = customize(template, "Acme Co!", "okta-terraform-acme-co");

        assert_eq!(
            out,
            "# okta-terraform-acme-co\n\
             Welcome Acme Co!! Tenant dir: environments/acme-co.\n\
             Acme Co! again."
        );
    }

    #[test]
    fn test_customize_leaves_unrelated_text_alone() {
        assert_eq!(customize("nothing here", "Acme", "r"), "nothing here");
    }

    #[test]
    fn test_commit_message_names_org() {
        assert_eq!(commit_message("Acme"), "chore: Customize README for Acme");
    }
}
