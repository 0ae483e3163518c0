use anyhow::Result;
use ruhezeit_core::OrganizeReport;
use tabled::{Table, Tabled};

use super::runtime::Runtime;

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Group")]
    title: String,
    #[tabled(rename = "Color")]
    color: &'static str,
    #[tabled(rename = "Tabs")]
    tabs: usize,
    #[tabled(rename = "Status")]
    status: &'static str,
}

fn rows(report: &OrganizeReport) -> Vec<GroupRow> {
    report
        .groups
        .iter()
        .map(|group| GroupRow {
            title: group.title.clone(),
            color: group.color.as_str(),
            tabs: group.tab_ids.len(),
            status: if report.failed_domains.contains(&group.domain) {
                "failed"
            } else {
                "grouped"
            },
        })
        .collect()
}

/// Group the snapshot's tabs by domain
pub async fn organize_command(rt: &Runtime) -> Result<()> {
    let report = rt.ext.categorizer.organize().await?;
    if report.groups.is_empty() {
        println!("No tabs to organize");
        return Ok(());
    }

    println!("Organized {} tabs", report.tab_count);
    println!("{}", Table::new(rows(&report)));
    Ok(())
}
