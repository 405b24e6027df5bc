//! wizard-runner: headless driver for the customer-onboarding wizard.
//!
//! Usage:
//!   wizard-runner --db onboarding.db --data-dir ./data --customer-type business
//!   wizard-runner --seed 7 --failure-rate 0.2
//!   wizard-runner --abandon-after createRetail
//!   wizard-runner --ipc-mode < commands.jsonl

use anyhow::Result;
use backoffice_core::{
    audit::AuditClock,
    command::WizardCommand,
    config::WizardConfig,
    fault::{FaultAction, FaultInjectingGateway},
    gateway::Operation,
    kyc_step::KycList,
    mandate_rule_step::MandateRuleTuple,
    mandate_step::MandateTuple,
    reference::ReferenceData,
    snapshot::WizardSnapshot,
    state::{CustomerType, ProductInput},
    store::BackOfficeStore,
    wizard::Wizard,
};
use std::env;
use std::io::{self, BufRead, Write};

type RunnerWizard = Wizard<FaultInjectingGateway<BackOfficeStore>>;

#[derive(serde::Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum ControlCommand {
    GetState,
    Quit,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum IpcLine {
    Control(ControlCommand),
    Wizard(WizardCommand),
}

#[derive(serde::Serialize)]
struct UiState {
    ok:    bool,
    error: Option<String>,
    ui:    WizardSnapshot,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let failure_rate = parse_arg(&args, "--failure-rate", 0.0f64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let data_dir = flag_value(&args, "--data-dir").unwrap_or("./data");
    let customer_type = flag_value(&args, "--customer-type")
        .and_then(CustomerType::parse)
        .unwrap_or(CustomerType::Retail);
    let abandon_after = match flag_value(&args, "--abandon-after") {
        Some(name) => Some(
            Operation::from_name(name)
                .ok_or_else(|| anyhow::anyhow!("Unknown operation for --abandon-after: {name}"))?,
        ),
        None => None,
    };

    if !ipc_mode {
        println!("Customer onboarding wizard runner");
        println!("  seed:          {seed}");
        println!("  failure rate:  {failure_rate}");
        println!("  db:            {db}");
        println!("  data_dir:      {data_dir}");
        println!("  customer type: {customer_type}");
        if let Some(op) = abandon_after {
            println!("  abandon after: {op}");
        }
        println!();
    }

    let config = WizardConfig::load(data_dir)?;
    let reference = ReferenceData::load(data_dir)?;
    let store = BackOfficeStore::open(db)?;
    store.migrate()?;
    store.seed_reference(&reference)?;

    let mut gateway = FaultInjectingGateway::new(store, seed).with_failure_rate(failure_rate);
    if let Some(op) = abandon_after {
        gateway = gateway.script(op, 1, FaultAction::AbandonAfter);
    }

    let session_id = format!("session-{seed}-{}", chrono::Utc::now().timestamp());
    let mut wizard = Wizard::new(session_id, config, AuditClock::System, gateway)?;
    let handle = wizard.activation_handle();
    wizard.gateway_mut().set_abandon_handle(handle);

    if ipc_mode {
        run_ipc_loop(&mut wizard)?;
    } else {
        run_demo(&mut wizard, customer_type, &reference);
        print_summary(&wizard)?;
    }

    persist_events(&wizard)?;
    Ok(())
}

fn run_ipc_loop(wizard: &mut RunnerWizard) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let line: IpcLine = match serde_json::from_str(&buffer) {
            Ok(l) => l,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let result = match line {
            IpcLine::Control(ControlCommand::Quit) => break,
            IpcLine::Control(ControlCommand::GetState) => Ok(()),
            IpcLine::Wizard(cmd) => wizard.apply(cmd),
        };
        let state = UiState {
            ok:    result.is_ok(),
            error: result.err().map(|e| e.to_string()),
            ui:    wizard.snapshot(),
        };
        writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
        stdout.flush()?;
    }
    Ok(())
}

/// Scripted onboarding using the first entries of the reference lists.
fn run_demo(wizard: &mut RunnerWizard, customer_type: CustomerType, reference: &ReferenceData) {
    let individual = reference
        .individual_kycs
        .first()
        .map(|k| k.individual_kyc_id.clone())
        .unwrap_or_default();
    let director = reference
        .individual_kycs
        .get(1)
        .map(|k| k.individual_kyc_id.clone())
        .unwrap_or_else(|| individual.clone());
    let business = reference
        .business_kycs
        .first()
        .map(|k| k.business_kyc_id.clone())
        .unwrap_or_default();
    let product = reference
        .product_types
        .first()
        .map(|p| p.product_type_id.clone())
        .unwrap_or_default();
    let mandate_type = reference
        .mandate_types
        .first()
        .map(|m| m.mandate_type_id.clone())
        .unwrap_or_default();

    let mut script = vec![
        WizardCommand::LoadReferenceData,
        WizardCommand::SelectCustomerType { customer_type },
    ];
    match customer_type {
        CustomerType::Retail => script.push(WizardCommand::SelectKyc {
            list:   KycList::AccountOwners,
            kyc_id: individual.clone(),
        }),
        CustomerType::Business => {
            script.push(WizardCommand::SelectKyc {
                list:   KycList::AccountOwners,
                kyc_id: business,
            });
            script.push(WizardCommand::SelectKyc {
                list:   KycList::OtherKycs,
                kyc_id: director,
            });
        }
    }
    script.extend([
        WizardCommand::Next,
        WizardCommand::SaveProduct {
            product: ProductInput::new(product, "USD", "Low"),
        },
        WizardCommand::Next,
        WizardCommand::SubmitMandates {
            mandates: vec![MandateTuple::new(individual, mandate_type.clone(), "Primary")],
        },
        WizardCommand::Next,
        WizardCommand::SubmitMandateRules {
            rules: vec![MandateRuleTuple {
                mandate_type,
                signing_rule:               "Any one to sign".into(),
                minimum_transaction_amount: "0".into(),
                maximum_transaction_amount: "5000".into(),
                maximum_daily_limit:        "10000".into(),
            }],
        },
        WizardCommand::Next,
    ]);

    for cmd in script {
        let name = cmd.name();
        if let Err(e) = wizard.apply(cmd) {
            log::warn!("demo stopped at {name}: {e}");
            println!("  stopped at {name}: {e}");
            break;
        }
    }
}

fn print_summary(wizard: &RunnerWizard) -> Result<()> {
    let store = wizard.gateway().inner();
    let operations = store.operation_names()?;
    let orphans = store.orphaned_mandates()?;

    println!("=== WIZARD SUMMARY ===");
    println!("  session:        {}", wizard.session_id);
    println!("  final step:     {}", wizard.step());
    println!("  path:           {}", wizard.route().path());
    println!("  closed:         {}", wizard.is_closed());
    println!(
        "  customer:       {}",
        wizard.completed_customer().unwrap_or("-")
    );
    println!("  events:         {}", wizard.event_log().len());

    println!();
    println!("=== NOTIFICATIONS ===");
    if wizard.notifications().is_empty() {
        println!("  (none)");
    }
    for n in wizard.notifications() {
        println!("  [{:?}] {}: {}", n.variant, n.title, n.description);
    }

    println!();
    println!("=== BACK OFFICE ===");
    println!("  customers:      {}", store.customer_count()?);
    println!("  retail:         {}", store.retail_count()?);
    println!("  business:       {}", store.business_count()?);
    println!("  mandates:       {}", store.mandate_count()?);
    println!("  accounts:       {}", store.account_count()?);
    println!("  mandate rules:  {}", store.mandate_rule_count()?);
    println!("  orphaned:       {}", orphans.len());
    println!("  operations:     {}", operations.join(" -> "));
    for (op, action) in wizard.gateway().injected() {
        println!("  injected:       {op} {action:?}");
    }
    Ok(())
}

fn persist_events(wizard: &RunnerWizard) -> Result<()> {
    let store = wizard.gateway().inner();
    for entry in wizard.event_log() {
        store.append_event(entry)?;
    }
    log::debug!("persisted {} events", wizard.event_log().len());
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
