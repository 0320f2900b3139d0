//! The setup issue opened in every provisioned repository.

use provisioning::NewIssue;

pub const TITLE: &str = "🚀 Your Okta Terraform Environment is Ready!";
pub const LABELS: [&str; 3] = ["setup", "documentation", "auto-configured"];

/// Values interpolated into the issue body.
#[derive(Debug, Clone, Copy)]
pub struct SetupIssueContext<'a> {
    pub org_name: &'a str,
    pub demo_id: &'a str,
    pub repo_url: &'a str,
    pub environments: &'a [&'a str],
    /// Environment holding the Okta secrets.
    pub tenant_environment: &'a str,
}

pub fn render(ctx: &SetupIssueContext<'_>) -> NewIssue {
    let SetupIssueContext {
        org_name,
        demo_id,
        repo_url,
        environments,
        tenant_environment,
    } = *ctx;
    let environment_list = environments.join(", ");

    let body = format!(
        r#"
# 🎉 Your Okta Terraform Environment is Ready!

This repository has been automatically configured for **{org_name}** (Demo: {demo_id}).

## ✅ What's Already Configured

- [x] GitHub repository created from template
- [x] GitHub Environments set up ({environment_list})
- [x] Okta secrets configured in **{tenant_environment}** environment
- [x] Workflows enabled and ready to use

## 🚀 Next Steps

### 1. Import Your Okta Configuration

Your Okta org is already connected. Import existing resources:

```bash
# Via GitHub CLI
gh workflow run import-all-resources.yml -f tenant_environment={tenant_environment}

# Or via GitHub UI
Actions → Import All Resources → Run workflow
```

### 2. Make Changes via Pull Requests

```bash
git checkout -b add-new-users
# Edit files in environments/{tenant_environment}/terraform/
git commit -m "feat: Add marketing team"
git push
# Create PR → Terraform plan runs automatically
```

## 📚 Documentation

- [CLAUDE.md]({repo_url}/blob/main/CLAUDE.md) - Complete repository guide
- [README.md]({repo_url}/blob/main/README.md) - Overview
- [docs/]({repo_url}/tree/main/docs) - Full documentation

## 🆘 Need Help?

- [Documentation Index]({repo_url}/blob/main/docs/00-INDEX.md)
- Create an issue in this repository

---

**Automatically configured by Demo Platform**
**Demo ID:** {demo_id}
**Repository:** {repo_url}
"#
    );

    NewIssue {
        title: TITLE.to_string(),
        body,
        labels: LABELS.iter().map(|l| l.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_interpolates_context() {
        let issue = render(&SetupIssueContext {
            org_name: "Acme Co!",
            demo_id: "demo-7",
            repo_url: "https://github.com/bot/okta-terraform-acme-co",
            environments: &["shared", "production"],
            tenant_environment: "shared",
        });

        assert_eq!(issue.title, TITLE);
        assert_eq!(issue.labels, vec!["setup", "documentation", "auto-configured"]);
        assert!(issue.body.contains("configured for **Acme Co!** (Demo: demo-7)"));
        assert!(issue.body.contains("Environments set up (shared, production)"));
        assert!(issue.body.contains("-f tenant_environment=shared"));
        assert!(issue
            .body
            .contains("https://github.com/bot/okta-terraform-acme-co/blob/main/docs/00-INDEX.md"));
    }
}
