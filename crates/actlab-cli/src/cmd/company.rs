use super::{print_models, show};
use crate::output::{cell, print_table};
use crate::session::Session;
use anyhow::Context;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum CompanySubcommand {
    /// List companies
    List,
    /// Show one company
    Show { id: i64 },
}

pub fn run(session: &Session, subcmd: CompanySubcommand, json: bool) -> anyhow::Result<()> {
    let client = session.connect()?;
    match subcmd {
        CompanySubcommand::List => {
            let companies = client.get_companies().context("failed to list companies")?;
            if json {
                return print_models(&companies);
            }
            let rows = companies
                .iter()
                .map(|c| vec![cell(c.id()), cell(c.name()), cell(c.office_homepage())])
                .collect();
            print_table(&["ID", "NAME", "HOMEPAGE"], rows);
            Ok(())
        }
        CompanySubcommand::Show { id } => {
            let company = client
                .get_company(id)
                .with_context(|| format!("company {id} not found"))?;
            show(&company, json)
        }
    }
}
