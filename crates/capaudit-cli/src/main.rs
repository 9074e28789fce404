use std::path::{Path, PathBuf};

use capaudit_core::{
    audit::Recommendation,
    capability::{Capability, CapabilityStatus},
    catalog,
    config::{self, AuditConfig},
    report::{generate_report, AuditReport, TagGroupAnalysis},
};
use clap::{Parser, Subcommand};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::Style;
use tracing_subscriber::EnvFilter;

// ── Palette ──────────────────────────────────────────────────────────

fn s_header() -> Style { Style::new().color256(252).bold() }  // bright gray, bold
fn s_dim() -> Style    { Style::new().color256(248) }         // light gray
fn s_tree() -> Style   { Style::new().color256(245) }         // mid gray
fn s_hint() -> Style   { Style::new().color256(243) }         // soft gray
fn s_ok() -> Style     { Style::new().color256(114) }         // green
fn s_warn() -> Style   { Style::new().color256(214) }         // amber
fn s_err() -> Style    { Style::new().color256(167) }         // red
fn s_price() -> Style  { Style::new().color256(109) }         // teal
fn s_bold() -> Style   { Style::new().bold() }
fn s_label() -> Style  { Style::new().color256(146) }         // muted lavender

fn sep(width: usize) -> String {
    s_tree().apply_to("\u{2500}".repeat(width)).to_string()
}

fn status_str(s: CapabilityStatus) -> String {
    match s {
        CapabilityStatus::Active     => format!("{}", s_ok().apply_to("\u{25cf} active")),
        CapabilityStatus::Beta       => format!("{}", s_warn().apply_to("\u{25d0} beta")),
        CapabilityStatus::Deprecated => format!("{}", s_err().apply_to("\u{2717} deprecated")),
        CapabilityStatus::Unknown    => format!("{}", s_dim().apply_to("? unknown")),
    }
}

fn fmt_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}k", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Per-1k prices are often fractions of a cent, so keep significant digits.
fn fmt_unit_cost(v: f64) -> String {
    if v == 0.0 {
        "free".to_string()
    } else if v >= 1.0 {
        format!("${:.2}", v)
    } else if v >= 0.01 {
        format!("${:.3}", v)
    } else {
        format!("${:.4}", v)
    }
}

fn fmt_money(v: f64, currency: &str) -> String {
    if currency.eq_ignore_ascii_case("USD") {
        format!("${:.2}", v)
    } else {
        format!("{:.2} {currency}", v)
    }
}

fn fmt_latency(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.1}s", ms / 1000.0)
    } else {
        format!("{:.0}ms", ms)
    }
}

// ── CLI Args ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "capaudit",
    about = "Audit a capability catalog and find cheaper alternatives of comparable quality",
    version,
    after_help = "examples:\n  \
        capaudit                                   (audit the bundled catalog)\n  \
        capaudit audit --catalog caps.toml --json\n  \
        capaudit list --tag embeddings\n  \
        capaudit list --status deprecated\n  \
        capaudit list --search openai\n  \
        capaudit tags"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Catalog file (.toml or .json). Defaults to the bundled sample catalog.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Audit config file. Defaults to ~/.config/capaudit/config.toml, then the bundled one.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, short, global = true)]
    json: bool,

    /// Log decisions to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit report: counts, deprecated items, per-tag recommendations.
    Audit,
    /// List catalog entries.
    List {
        #[arg(long, short)]
        tag: Option<String>,
        #[arg(long, short)]
        status: Option<CapabilityStatus>,
        /// Substring of id, name or provider.
        #[arg(long, short = 'q')]
        search: Option<String>,
    },
    /// Tags with member counts.
    Tags,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let caps = load_catalog(cli.catalog.as_deref())?;

    match cli.command {
        Some(Commands::Audit) | None => {
            let config = load_config(cli.config.as_deref())?;
            cmd_audit(&caps, &config, cli.json)?;
        }
        Some(Commands::List {
            ref tag,
            status,
            ref search,
        }) => {
            cmd_list(&caps, tag.as_deref(), status, search.as_deref(), cli.json)?;
        }
        Some(Commands::Tags) => {
            cmd_tags(&caps, cli.json)?;
        }
    }
    Ok(())
}

// ── Setup ────────────────────────────────────────────────────────────

/// Logs go to stderr so `--json` output stays clean.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,capaudit_cli=debug,capaudit_core=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn load_catalog(path: Option<&Path>) -> anyhow::Result<Vec<Capability>> {
    let caps = match path {
        Some(p) => catalog::load_catalog(p)?,
        None => catalog::load_bundled_catalog()?,
    };
    for (id, alt) in catalog::dangling_alternatives(&caps) {
        tracing::warn!(capability = id, alternative = alt, "alternative not in catalog");
    }
    Ok(caps)
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AuditConfig> {
    Ok(match path {
        Some(p) => config::load_config(p)?,
        None => config::load_config_cached()?,
    })
}

// ── Audit ────────────────────────────────────────────────────────────

fn cmd_audit(caps: &[Capability], config: &AuditConfig, json: bool) -> anyhow::Result<()> {
    let report = generate_report(caps, config);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_dashboard(&report, &config.currency);
    print_deprecated(&report);
    for group in &report.tag_groups {
        print_group(group, &config.currency);
    }
    println!();
    Ok(())
}

fn print_dashboard(report: &AuditReport<'_>, currency: &str) {
    println!();
    println!(
        "{}  {}",
        s_header().apply_to("capability audit"),
        s_hint().apply_to(report.timestamp.format("%Y-%m-%d %H:%M UTC").to_string())
    );
    println!("{}", sep(64));
    println!(
        "  {:<22} {}",
        s_label().apply_to("total capabilities"),
        s_bold().apply_to(report.total_capabilities)
    );
    println!(
        "  {:<22} {}",
        s_label().apply_to("active"),
        s_ok().apply_to(report.active_count)
    );
    println!(
        "  {:<22} {}",
        s_label().apply_to("deprecated"),
        s_err().apply_to(report.deprecated_count)
    );
    println!(
        "  {:<22} {}  {}",
        s_label().apply_to("potential savings"),
        s_price().apply_to(fmt_money(report.total_potential_savings(), currency)),
        s_hint().apply_to(format!(
            "/ month across {} recommendations",
            report.recommendation_count()
        ))
    );
    println!("{}", sep(64));
}

fn print_deprecated(report: &AuditReport<'_>) {
    if report.deprecated_items.is_empty() {
        return;
    }
    println!();
    println!("  {}", s_header().apply_to("deprecated"));
    for cap in &report.deprecated_items {
        let services = if cap.usage.used_by_services.is_empty() {
            String::new()
        } else {
            format!("still used by {}", cap.usage.used_by_services.join(", "))
        };
        println!(
            "  {} {:<36} {}",
            s_err().apply_to("\u{2717}"),
            s_bold().apply_to(&cap.id),
            s_dim().apply_to(services)
        );
        if let Some(alt) = cap.alternatives.first() {
            println!("    {}", s_hint().apply_to(format!("migrate to {alt}")));
        }
    }
}

fn print_group(group: &TagGroupAnalysis<'_>, currency: &str) {
    println!();
    let savings = group.total_savings();
    let savings_str = if group.recommendations.is_empty() {
        s_hint().apply_to("no recommendations").to_string()
    } else {
        s_price()
            .apply_to(format!("{} / month", fmt_money(savings, currency)))
            .to_string()
    };
    println!("  {}  {}", s_header().apply_to(format!("#{}", group.tag)), savings_str);

    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("  Benchmark").fg(Color::AnsiValue(243)),
        Cell::new("Capability").fg(Color::AnsiValue(243)),
        Cell::new("$/1k").fg(Color::AnsiValue(243)),
        Cell::new("Latency").fg(Color::AnsiValue(243)),
        Cell::new("Quality").fg(Color::AnsiValue(243)),
    ]);
    for (label, cap) in [
        ("cheapest", group.cheapest),
        ("fastest", group.fastest),
        ("best quality", group.best_quality),
    ] {
        table.add_row(vec![
            Cell::new(format!("  {label}")).fg(Color::AnsiValue(146)),
            Cell::new(&cap.id).fg(Color::AnsiValue(252)),
            Cell::new(fmt_unit_cost(cap.cost())).fg(Color::AnsiValue(109)),
            Cell::new(fmt_latency(cap.latency_ms())).fg(Color::AnsiValue(248)),
            Cell::new(format!("{:.2}", cap.quality())).fg(Color::AnsiValue(248)),
        ]);
    }
    println!("{table}");

    for rec in &group.recommendations {
        print_recommendation(rec, currency);
    }
}

fn print_recommendation(rec: &Recommendation, currency: &str) {
    println!(
        "    {} {} {} {}",
        s_warn().apply_to("\u{25b8}"),
        s_bold().apply_to(&rec.capability_id),
        s_tree().apply_to("\u{2192}"),
        s_ok().apply_to(&rec.better_alternative_id),
    );
    println!("      {}", s_dim().apply_to(&rec.reason));
    println!(
        "      {}",
        s_price().apply_to(format!(
            "save ~{} / month at {} calls",
            fmt_money(rec.potential_savings, currency),
            fmt_count(rec.monthly_volume)
        ))
    );
}

// ── List ─────────────────────────────────────────────────────────────

fn cmd_list(
    caps: &[Capability],
    tag: Option<&str>,
    status: Option<CapabilityStatus>,
    search: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let filtered: Vec<&Capability> = caps
        .iter()
        .filter(|c| tag.map_or(true, |t| c.has_tag(t)))
        .filter(|c| status.map_or(true, |s| c.status == s))
        .filter(|c| search.map_or(true, |q| c.matches(q)))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&filtered)?);
        return Ok(());
    }

    if filtered.is_empty() {
        eprintln!("{}", s_err().apply_to("no capabilities match"));
        return Ok(());
    }

    println!();
    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("  Id").fg(Color::AnsiValue(243)),
        Cell::new("Type").fg(Color::AnsiValue(243)),
        Cell::new("Provider").fg(Color::AnsiValue(243)),
        Cell::new("Status").fg(Color::AnsiValue(243)),
        Cell::new("$/1k").fg(Color::AnsiValue(243)),
        Cell::new("Latency").fg(Color::AnsiValue(243)),
        Cell::new("Quality").fg(Color::AnsiValue(243)),
        Cell::new("Calls/mo").fg(Color::AnsiValue(243)),
        Cell::new("Tags").fg(Color::AnsiValue(243)),
    ]);
    for c in &filtered {
        let calls = match c.usage.estimated_monthly_calls {
            0 => "\u{2500}".to_string(),
            n => fmt_count(n),
        };
        table.add_row(vec![
            Cell::new(format!("  {}", c.id)).fg(Color::AnsiValue(252)),
            Cell::new(c.kind.to_string()).fg(Color::AnsiValue(146)),
            Cell::new(&c.provider).fg(Color::AnsiValue(248)),
            Cell::new(status_str(c.status)),
            Cell::new(fmt_unit_cost(c.cost())).fg(Color::AnsiValue(109)),
            Cell::new(fmt_latency(c.latency_ms())).fg(Color::AnsiValue(248)),
            Cell::new(format!("{:.2}", c.quality())).fg(Color::AnsiValue(248)),
            Cell::new(calls).fg(Color::AnsiValue(248)),
            Cell::new(c.tags.join(", ")).fg(Color::AnsiValue(139)),
        ]);
    }
    println!("{table}");
    println!(
        "  {}",
        s_hint().apply_to(format!("{} of {} capabilities", filtered.len(), caps.len()))
    );
    println!();
    Ok(())
}

// ── Tags ─────────────────────────────────────────────────────────────

fn cmd_tags(caps: &[Capability], json: bool) -> anyhow::Result<()> {
    let rows: Vec<(&str, usize, usize)> = catalog::all_tags(caps)
        .into_iter()
        .map(|t| {
            let members = caps.iter().filter(|c| c.has_tag(t));
            let total = members.clone().count();
            let auditable = members.filter(|c| c.status.is_auditable()).count();
            (t, total, auditable)
        })
        .collect();

    if json {
        let v: Vec<serde_json::Value> = rows
            .iter()
            .map(|(t, total, auditable)| {
                serde_json::json!({ "tag": t, "total": total, "auditable": auditable })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&v)?);
        return Ok(());
    }

    println!();
    println!("{}", s_header().apply_to("tags"));
    println!("{}", sep(40));
    for (t, total, auditable) in &rows {
        println!(
            "  {:<24} {} {}",
            s_bold().apply_to(t),
            s_dim().apply_to(format!("{total} capabilities")),
            s_hint().apply_to(format!("({auditable} audited)"))
        );
    }
    println!("{}", sep(40));
    Ok(())
}
