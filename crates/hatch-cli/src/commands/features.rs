//! `hatch features`: Report which optional host features are available.

use clap::Args;
use hatch_core::host::{HostReport, SystemHost};

use crate::output::{format_flag, format_optional};

/// Arguments for the `features` command.
#[derive(Args, Debug)]
pub struct FeaturesArgs {
    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `features` command.
///
/// # Errors
///
/// Returns an error if the report cannot be serialized.
pub fn execute(args: &FeaturesArgs) -> anyhow::Result<()> {
    let report = HostReport::collect(&SystemHost);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    for (name, value) in render(&report) {
        println!("{name:<18} {value}");
    }
    Ok(())
}

fn render(report: &HostReport) -> Vec<(&'static str, String)> {
    vec![
        ("selinux", format_flag(report.selinux).into()),
        ("systemd-cgroups", format_flag(report.systemd_cgroups).into()),
        ("intel-rdt-cat", format_flag(report.rdt_cat).into()),
        ("intel-rdt-mba", format_flag(report.rdt_mba).into()),
        (
            "newuidmap",
            format_optional(report.newuidmap.as_deref().map(std::path::Path::display)),
        ),
        (
            "newgidmap",
            format_optional(report.newgidmap.as_deref().map(std::path::Path::display)),
        ),
        ("rootless", format_flag(report.rootless_euid).into()),
    ]
}
