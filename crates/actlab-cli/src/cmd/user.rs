use super::{print_models, report, show};
use crate::output::{cell, print_table};
use crate::session::Session;
use anyhow::Context;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum UserSubcommand {
    /// List users
    List,
    /// Show one user of a company
    Show { company: i64, id: i64 },
    /// Create a user account
    New {
        #[arg(long)]
        email: String,
        /// Password for the new account
        #[arg(long = "user-password")]
        password: String,
        #[arg(long)]
        company: i64,
        /// Administrator, Manager, Member, Subcontractor or Client
        #[arg(long = "type", default_value = "Member")]
        user_type: String,
    },
}

pub fn run(session: &Session, subcmd: UserSubcommand, json: bool) -> anyhow::Result<()> {
    let client = session.connect()?;
    match subcmd {
        UserSubcommand::List => {
            let users = client.get_users().context("failed to list users")?;
            if json {
                return print_models(&users);
            }
            let rows = users
                .iter()
                .map(|u| {
                    let name = [u.first_name(), u.last_name()]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join(" ");
                    vec![cell(u.id()), name, cell(u.email()), cell(u.role())]
                })
                .collect();
            print_table(&["ID", "NAME", "EMAIL", "ROLE"], rows);
            Ok(())
        }
        UserSubcommand::Show { company, id } => {
            let user = client
                .get_user(company, id)
                .with_context(|| format!("user {id} not found in company {company}"))?;
            show(&user, json)
        }
        UserSubcommand::New {
            email,
            password,
            company,
            user_type,
        } => {
            let user = client
                .new_user(&email, &password, company, &user_type)
                .with_context(|| format!("failed to create user '{email}'"))?;
            report("Created", &user, json)
        }
    }
}
