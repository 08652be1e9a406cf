use cloudquote_core::cpq::format::format_amount;
use cloudquote_core::{
    BaasInput, BaasQuote, BaasQuoteInput, CalculatorRuntime, ConfigDiagnostic, CurrentUser,
    DeterministicCalculator, DeviceType, PricingSnapshot, UserId, VpsForm, VpsInput, VpsQuote,
    VpsQuoteInput,
};
use cloudquote_db::SnapshotRepository;
use tracing::{info, warn};

use crate::commands::{
    build_runtime, load_config, open_store, persistence_failure, CommandResult, StepFailure,
};

#[derive(Clone, Debug)]
pub struct VpsArgs {
    pub user: String,
    pub category: String,
    pub form: VpsForm,
    pub json: bool,
}

#[derive(Clone, Debug)]
pub struct BaasArgs {
    pub user: String,
    pub gigabytes: Option<String>,
    pub device: Option<DeviceType>,
    pub count: Option<String>,
    pub json: bool,
}

impl BaasArgs {
    fn input(&self) -> BaasInput {
        match self.device {
            Some(device) => {
                BaasInput::per_device_from_text(device, self.count.as_deref().unwrap_or("1"))
            }
            None => BaasInput::per_gb_from_text(self.gigabytes.as_deref().unwrap_or("1")),
        }
    }
}

pub fn run_vps(args: VpsArgs) -> CommandResult {
    let command = "quote vps";
    let (calculator, snapshot) = match prepare(command) {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };
    let user = match current_user(&snapshot, &args.user) {
        Ok(user) => user,
        Err(failure) => return CommandResult::from((command, failure)),
    };

    let quote = calculator.quote_vps(VpsQuoteInput {
        snapshot: &snapshot,
        user: &user,
        category: &args.category,
        input: VpsInput::from_form(&args.form),
    });
    log_diagnostics(command, &quote.diagnostics);
    info!(
        event_name = "cli.quote.vps",
        user_id = %user.id,
        category = %args.category,
        final_cost = %quote.breakdown.final_cost,
        discounted_cost = %quote.breakdown.discounted_cost,
        "vps quote computed"
    );

    if args.json {
        return render_json(command, &quote);
    }
    CommandResult::report(render_vps(&quote))
}

pub fn run_baas(args: BaasArgs) -> CommandResult {
    let command = "quote baas";
    let (calculator, snapshot) = match prepare(command) {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };
    let user = match current_user(&snapshot, &args.user) {
        Ok(user) => user,
        Err(failure) => return CommandResult::from((command, failure)),
    };

    let quote =
        calculator.quote_baas(BaasQuoteInput { snapshot: &snapshot, user: &user, input: args.input() });
    log_diagnostics(command, &quote.diagnostics);
    info!(
        event_name = "cli.quote.baas",
        user_id = %user.id,
        final_cost = %quote.breakdown.final_cost,
        "baas quote computed"
    );

    if args.json {
        return render_json(command, &quote);
    }
    CommandResult::report(render_baas(&quote))
}

fn prepare(command: &str) -> Result<(DeterministicCalculator, PricingSnapshot), CommandResult> {
    let config = load_config(command)?;
    let runtime = build_runtime(command)?;

    let latest = runtime.block_on(async {
        let (pool, repo) = open_store(&config).await?;
        let latest = repo
            .load_latest()
            .await
            .map_err(persistence_failure);
        pool.close().await;
        latest
    });

    match latest {
        Ok(Some(stored)) => {
            Ok((DeterministicCalculator::new(config.calculator_options()), stored.snapshot))
        }
        Ok(None) => Err(CommandResult::failure(
            command,
            "no_snapshot",
            "no pricing snapshot stored; run `cloudquote seed` first",
            7,
        )),
        Err(failure) => Err(CommandResult::from((command, failure))),
    }
}

fn current_user(snapshot: &PricingSnapshot, raw_id: &str) -> Result<CurrentUser, StepFailure> {
    let id = UserId::new(raw_id.trim());
    snapshot
        .account(&id)
        .map(|account| CurrentUser { id: account.id.clone(), role: account.role })
        .ok_or_else(|| ("unknown_user", format!("no account with id `{id}`"), 8u8))
}

fn log_diagnostics(command: &str, diagnostics: &[ConfigDiagnostic]) {
    for diagnostic in diagnostics {
        warn!(
            event_name = "cli.quote.diagnostic",
            command,
            code = diagnostic.code(),
            "{diagnostic}"
        );
    }
}

fn render_json(command: &str, quote: &impl serde::Serialize) -> CommandResult {
    match serde_json::to_string_pretty(quote) {
        Ok(output) => CommandResult::report(output),
        Err(error) => CommandResult::failure(command, "serialization", error.to_string(), 10),
    }
}

fn render_vps(quote: &VpsQuote) -> String {
    let breakdown = &quote.breakdown;
    let money = |amount| format_amount(amount, quote.currency);
    let mut lines = vec![
        format!(
            "VPS {} | {} vCPU, {} GB RAM ({} GB included), {} GB {} storage, {} VM, {} GB BAAS",
            breakdown.category,
            quote.input.cpu_count,
            quote.input.ram_gb,
            breakdown.included_ram_gb,
            quote.input.storage_gb,
            if breakdown.nvme_storage { "NVME" } else { "SSD" },
            quote.input.vm_count,
            quote.input.baas_backup_gb
        ),
        format!("- server cost:   {}", money(breakdown.server_cost)),
        format!(
            "- hardware cost: {} (+{}% hardware margin)",
            money(breakdown.hardware_cost),
            breakdown.hardware_margin_percent
        ),
        format!("- infra cost:    {}", money(breakdown.infra_cost)),
        format!("- total cost:    {}", money(breakdown.total_cost)),
        format!("- final price:   {} (+{}% margin)", quote.display_final, breakdown.margin_percent),
    ];
    if quote.discount.percent > rust_decimal::Decimal::ZERO {
        lines.push(format!(
            "- discounted:    {} (-{}% volume discount)",
            quote.display_discounted, quote.discount.percent
        ));
    }
    lines.extend(render_diagnostics(&quote.diagnostics));
    lines.join("\n")
}

fn render_baas(quote: &BaasQuote) -> String {
    let mut lines = vec![
        format!("BAAS {}", describe_baas(&quote.input)),
        format!("- base cost:   {}", format_amount(quote.breakdown.base_cost, quote.currency)),
        format!(
            "- final price: {} (+{}% margin)",
            quote.display_final, quote.breakdown.margin_percent
        ),
    ];
    lines.extend(render_diagnostics(&quote.diagnostics));
    lines.join("\n")
}

fn describe_baas(input: &BaasInput) -> String {
    match input {
        BaasInput::PerGb { gigabytes } => format!("| {gigabytes} GB"),
        BaasInput::PerDevice { device: DeviceType::Server, count } => format!("| {count} server(s)"),
        BaasInput::PerDevice { device: DeviceType::Workstation, count } => {
            format!("| {count} workstation(s)")
        }
    }
}

fn render_diagnostics(diagnostics: &[ConfigDiagnostic]) -> impl Iterator<Item = String> + '_ {
    diagnostics.iter().map(|diagnostic| format!("! {}: {diagnostic}", diagnostic.code()))
}
