use clap::Parser;
use jouken::prelude::*;
use jouken::schema::wire::module_to_json;
use rand::Rng;
use rand::rngs::ThreadRng;
use std::fs;

/// A CLI tool to generate a random module schema and a matching data snapshot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Where to write the module JSON
    #[arg(short, long, default_value = "generated_module.json")]
    output: String,

    /// Where to write the data snapshot JSON
    #[arg(short, long, default_value = "generated_data.json")]
    data_output: String,

    /// Number of top-level sections
    #[arg(long, default_value_t = 3)]
    sections: usize,

    /// Maximum nesting depth below a section
    #[arg(long, default_value_t = 2)]
    depth: usize,

    /// Maximum fields per section or group
    #[arg(long, default_value_t = 4)]
    width: usize,

    /// Module key of the generated schema
    #[arg(long, default_value = "main")]
    module: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    if cli.width == 0 {
        eprintln!("Error: --width must be at least 1");
        std::process::exit(1);
    }

    println!(
        "Generating module '{}' ({} sections, depth {}, width up to {})...",
        cli.module, cli.sections, cli.depth, cli.width
    );

    let mut generator = Generator {
        rng: &mut rng,
        fields: Vec::new(),
        leaves: Vec::new(),
    };
    for section in 0..cli.sections {
        let id = format!("section{}", section);
        generator.generate(None, &id, section as i32, cli.depth, cli.width);
    }
    let Generator { fields, leaves, .. } = generator;

    let rules = generate_rules(&mut rng, &leaves);
    let data = generate_data(&mut rng, &cli.module, &leaves);

    let module = ModuleSchema {
        key: cli.module.clone(),
        fields,
        rules,
    };
    println!(
        "-> {} fields, {} rules (complexity {:.2})",
        module.fields.len(),
        module.rules.len(),
        calculate_metrics(&module.fields).complexity_score
    );

    fs::write(&cli.output, module_to_json(&module)?)?;
    let data_json = serde_json::to_string_pretty(&data.to_json())?;
    fs::write(&cli.data_output, data_json)?;

    println!(
        "Successfully wrote '{}' and '{}'",
        cli.output, cli.data_output
    );
    Ok(())
}

struct Generator<'r> {
    rng: &'r mut ThreadRng,
    fields: Vec<FormFieldSchema>,
    /// Ids of generated input (non-group) fields.
    leaves: Vec<String>,
}

impl Generator<'_> {
    fn generate(&mut self, parent: Option<&str>, id: &str, order: i32, depth: usize, width: usize) {
        let is_group = parent.is_none() || (depth > 0 && self.rng.random_bool(0.3));
        let mut field = FormFieldSchema::new(id).with_order(order).with_label(id);
        if let Some(parent) = parent {
            field = field.with_parent(parent);
        }

        if !is_group {
            field = field.with_type("number");
            if self.rng.random_bool(0.4) {
                field = field.required();
            }
            self.fields.push(field);
            self.leaves.push(id.to_string());
            return;
        }

        self.fields.push(field.with_type("section"));
        let children = self.rng.random_range(1..=width);
        for i in 0..children {
            let child_id = format!("{}_{}", id, i);
            let child_depth = depth.saturating_sub(1);
            self.generate(Some(id), &child_id, i as i32, child_depth, width);
        }
    }
}

/// One show/hide or setRequired rule per few input fields, keyed on an earlier field.
fn generate_rules(rng: &mut ThreadRng, leaves: &[String]) -> Vec<ConditionalRule> {
    let actions = [RuleAction::Show, RuleAction::Hide, RuleAction::SetRequired];
    let mut rules = Vec::new();

    for (i, target) in leaves.iter().enumerate().skip(1) {
        if !rng.random_bool(0.35) {
            continue;
        }
        let source = &leaves[rng.random_range(0..i)];
        let threshold: i32 = rng.random_range(0..100);
        let operator = if rng.random_bool(0.5) {
            ConditionOperator::LessThan
        } else {
            ConditionOperator::GreaterThanOrEqual
        };

        let mut condition = Condition::leaf(source.as_str(), operator, threshold);
        if rng.random_bool(0.3) {
            condition = Condition::and(vec![
                condition,
                Condition::leaf(source.as_str(), ConditionOperator::IsNotEmpty, Value::Null),
            ]);
        }

        rules.push(
            ConditionalRule::new(
                format!("rule{}", rules.len()),
                actions[rng.random_range(0..actions.len())],
                condition,
            )
            .with_target_field(target.as_str())
            .with_priority(rng.random_range(1..=5) * 10),
        );
    }
    rules
}

fn generate_data(rng: &mut ThreadRng, module: &str, leaves: &[String]) -> WorkflowFormData {
    let mut data = WorkflowFormData::new(module);
    for leaf in leaves {
        // Leave some fields blank so required checks have something to report.
        if rng.random_bool(0.8) {
            data.insert(module, leaf.as_str(), rng.random_range(0..100_i32));
        }
    }
    println!("-> Generated data for {} field(s).", leaves.len());
    data
}
