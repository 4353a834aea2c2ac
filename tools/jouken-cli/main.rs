use clap::{Parser, Subcommand};
use jouken::hierarchy::HierarchyValidation;
use jouken::prelude::*;
use jouken::rules::validate_rule;
use jouken::schema::wire::fields_to_json;
use std::fs;
use std::time::Instant;
use tracing::Level;

/// Inspect form modules, evaluate conditional rules and step through workflows
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Print debug diagnostics (skipped rules, resolved code sets, ...)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a module's field tree and print it with metrics and validation results
    Hierarchy {
        /// Path to the module JSON file
        module_path: String,
    },
    /// Print the module's fields with self references and orphaned parents cleared
    Fix {
        /// Path to the module JSON file
        module_path: String,
        /// Write the repaired fields here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Evaluate a rule set against a data snapshot and list the triggered rules
    Evaluate {
        /// Path to a JSON array of rules, or a module JSON file
        rules_path: String,
        /// Path to the data snapshot (`{"Module": {"field": value}}`)
        data_path: String,
        /// The module unqualified field references resolve against
        #[arg(short, long, default_value = "main")]
        module: String,
    },
    /// Compute the workflow state that follows the given step
    Navigate {
        /// Path to the workflow JSON file
        workflow_path: String,
        /// Path to the data snapshot
        data_path: String,
        /// Current step number; omit when the workflow has not started
        #[arg(short, long)]
        from: Option<u32>,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_target(false)
        .init();

    match cli.command {
        Command::Hierarchy { module_path } => run_hierarchy(&module_path),
        Command::Fix {
            module_path,
            output,
        } => run_fix(&module_path, output.as_deref()),
        Command::Evaluate {
            rules_path,
            data_path,
            module,
        } => run_evaluate(&rules_path, &data_path, &module),
        Command::Navigate {
            workflow_path,
            data_path,
            from,
        } => run_navigate(&workflow_path, &data_path, from),
    }
}

fn run_hierarchy(module_path: &str) {
    let module = load_module(module_path);

    let build_start = Instant::now();
    let hierarchy = HierarchyBuilder::new(module.fields.clone()).build();
    let build_duration = build_start.elapsed();

    println!("Module '{}' ({} fields)\n", module.key, hierarchy.len());
    print!("{}", hierarchy);

    let metrics = hierarchy.metrics();
    println!("\n--- Metrics ---");
    println!("Total Fields:             {}", metrics.total_fields);
    println!("Root Fields:              {}", metrics.root_fields);
    println!("Max Depth:                {}", metrics.max_depth);
    println!("Average Depth:            {:.2}", metrics.average_depth);
    println!("Conditional Fields:       {}", metrics.conditional_fields);
    println!(
        "Avg Children per Parent:  {:.2}",
        metrics.avg_children_per_parent
    );
    println!("Complexity Score:         {:.2}", metrics.complexity_score);

    print_validation(&validate_hierarchy(&module.fields));

    let rule_issues: Vec<String> = module
        .all_rules()
        .iter()
        .flat_map(validate_rule)
        .map(|issue| issue.to_string())
        .collect();
    if !rule_issues.is_empty() {
        println!("\n--- Rule Issues ---");
        for issue in rule_issues {
            println!("  {}", issue);
        }
    }

    println!("\nBuilt in {:?}", build_duration);
}

fn print_validation(validation: &HierarchyValidation) {
    println!("\n--- Validation ---");
    if validation.errors.is_empty() && validation.warnings.is_empty() {
        println!("  No issues found");
    }
    for error in &validation.errors {
        println!("  error:   {}", error);
    }
    for warning in &validation.warnings {
        println!("  warning: {}", warning);
    }
}

fn run_fix(module_path: &str, output: Option<&str>) {
    let module = load_module(module_path);
    let fixed = fix_hierarchy_issues(&module.fields);

    let changed = module
        .fields
        .iter()
        .zip(&fixed)
        .filter(|(before, after)| before.parent_id != after.parent_id)
        .count();

    let json = fields_to_json(&fixed)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize fields: {}", e)));
    match output {
        Some(path) => {
            fs::write(path, json).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to write '{}': {}", path, e))
            });
            println!("Cleared {} parent reference(s); wrote '{}'", changed, path);
        }
        None => {
            eprintln!("Cleared {} parent reference(s)", changed);
            println!("{}", json);
        }
    }

    let remaining = validate_hierarchy(&fixed);
    if !remaining.is_valid() {
        eprintln!("Issues that need an author's decision remain:");
        for error in remaining.errors {
            eprintln!("  error: {}", error);
        }
    }
}

fn run_evaluate(rules_path: &str, data_path: &str, module: &str) {
    let rules_json = read_file(rules_path);
    // Accept either a bare rule array or a whole module.
    let rules = parse_rules(&rules_json)
        .or_else(|_| parse_module(&rules_json).map(|m| m.all_rules()))
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse rules: {}", e)));
    let data = WorkflowFormData::from_file(data_path, module).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to load data from '{}': {}", data_path, e))
    });

    let evaluator = RuleEvaluator::new();
    let eval_start = Instant::now();
    let triggered = evaluator.evaluate_rules(&rules, &data);
    let eval_duration = eval_start.elapsed();

    println!(
        "{} of {} rule(s) triggered (current module '{}')",
        triggered.len(),
        rules.len(),
        module
    );
    for result in &triggered {
        let target = match result.rule.target() {
            Ok(target) => format!("{:?}", target),
            Err(e) => e.to_string(),
        };
        println!(
            "  -> [P{}] {} {} {}",
            result.rule.priority, result.rule.id, result.rule.action, target
        );
        println!("     Reason: {}", result.reason);
        if let Some(error) = &result.error_message {
            println!("     Errors: {}", error);
        }
    }
    println!("\nEvaluated in {:?}", eval_duration);
}

fn run_navigate(workflow_path: &str, data_path: &str, from: Option<u32>) {
    let schema = parse_workflow(&read_file(workflow_path))
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse workflow: {}", e)));

    let current = match from {
        Some(step) => WorkflowState::InStep(step),
        None => WorkflowState::NotStarted,
    };
    let current_module = from
        .and_then(|step| schema.step(step))
        .or_else(|| schema.steps.first())
        .map(|step| step.module_key.clone())
        .unwrap_or_default();
    let data = WorkflowFormData::from_file(data_path, &current_module).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to load data from '{}': {}", data_path, e))
    });

    let navigator = WorkflowNavigator::new(&schema);
    let missing: Vec<String> = navigator
        .referenced_modules()
        .into_iter()
        .filter(|m| !data.contains_module(m))
        .collect();
    if !missing.is_empty() {
        eprintln!("Note: no data loaded for module(s) {}", missing.join(", "));
    }

    let transition = navigator.next_state(current, &data);
    println!("{} -> {}", transition.from, transition.next);
    if let WorkflowState::InStep(n) = transition.next {
        if let Some(step) = schema.step(n) {
            println!("  Next step: {} ({})", step.title, step.module_key);
        }
    }
    if !transition.skipped_steps.is_empty() {
        println!("  Skipped steps: {:?}", transition.skipped_steps);
    }
    for rule_id in &transition.applied_rules {
        println!("  Applied rule: {}", rule_id);
    }
}

fn load_module(path: &str) -> ModuleSchema {
    parse_module(&read_file(path))
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse module '{}': {}", path, e)))
}

fn read_file(path: &str) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read file '{}': {}", path, e)))
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
