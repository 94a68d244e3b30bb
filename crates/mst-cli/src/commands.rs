use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;

use mst_driver::{DriverConfig, MergeDriver, MergeRun, StepKind};
use mst_factors::UniformTask;
use mst_tree::{MergeTree, MergeTreeBuilder, ReconcileKind, TreeShape};
use mst_types::{FactorIndex, MergePair, SeededRng, TieBreakPolicy};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run(args) => cmd_run(args, cli.format),
        Command::Plan(args) => cmd_plan(args, cli.format),
        Command::Reconcile(args) => cmd_reconcile(args, cli.format),
    }
}

fn cmd_run(args: RunArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    let task = UniformTask::new("uniform", args.task.variables, args.task.domain);
    let run = MergeDriver::new(config).run(&task)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&run)?),
        OutputFormat::Text => print_run(&run),
    }
    Ok(())
}

/// File values first, then any flag given on the command line.
fn resolve_config(args: &RunArgs) -> anyhow::Result<DriverConfig> {
    let mut config = match &args.config {
        Some(path) => DriverConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DriverConfig::default(),
    };
    if let Some(tie_break) = &args.tie_break {
        config.tie_break = tie_break.parse()?;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(shape) = &args.shape {
        config.tree_shape = shape.parse()?;
    }
    if let Some(selector) = &args.selector {
        config.selector = selector.parse()?;
    }
    config.dump_tree |= args.dump;
    Ok(config)
}

fn print_run(run: &MergeRun) {
    println!(
        "{} {} merges on {} with {}",
        "✓".green().bold(),
        run.steps.len(),
        run.task.bold(),
        run.selector.cyan()
    );
    for step in &run.steps {
        let kind = match step.kind {
            StepKind::Planned => "planned".dimmed(),
            StepKind::DirectMerge => "direct".green(),
            StepKind::Restructure { kept } => format!("restructured, kept {kept}").yellow(),
        };
        println!("  {:>3}  {} -> {}  {}", step.step, step.pair, step.new_index.to_string().bold(), kind);
    }
    println!("  Final factor: {}", run.final_factor.to_string().bold());
    if run.divergences > 0 {
        println!("  Divergences: {}", run.divergences.to_string().yellow());
    }
}

fn cmd_plan(args: PlanArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut tree = build_tree(args.variables, &args.shape, TieBreakPolicy::UseFirst, 0)?;
    let dump = tree.dump(args.indent);

    let mut order = Vec::new();
    let mut next = FactorIndex::new(args.variables);
    while !tree.is_done() {
        order.push(tree.next_merge(next)?);
        next = FactorIndex::new(next.get() + 1);
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "tree": dump, "order": order }))?)
        }
        OutputFormat::Text => {
            print!("{dump}");
            println!("{}", "Merge order:".bold());
            for (step, pair) in order.iter().enumerate() {
                println!("  {:>3}  {}", step, pair);
            }
        }
    }
    Ok(())
}

fn cmd_reconcile(args: ReconcileArgs, format: OutputFormat) -> anyhow::Result<()> {
    let tie_break: TieBreakPolicy = args.tie_break.parse()?;
    let mut tree = build_tree(args.variables, &args.shape, tie_break, args.seed)?;

    let mut outcomes = Vec::with_capacity(args.merges.len());
    let mut next = FactorIndex::new(args.variables);
    for text in &args.merges {
        let pair = parse_pair(text)?;
        let outcome = tree
            .reconcile(pair, next)
            .with_context(|| format!("reconciling merge {pair}"))?;
        outcomes.push((pair, next, outcome.kind));
        next = FactorIndex::new(next.get() + 1);
    }

    match format {
        OutputFormat::Json => {
            let steps: Vec<_> = outcomes
                .iter()
                .map(|(pair, new_index, kind)| {
                    let kept = match kind {
                        ReconcileKind::DirectMerge => None,
                        ReconcileKind::Restructure { kept } => Some(*kept),
                    };
                    json!({ "pair": pair, "new_index": new_index, "kept": kept })
                })
                .collect();
            let out = json!({ "steps": steps, "tree": tree.dump(2), "done": tree.is_done() });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            for (pair, new_index, kind) in &outcomes {
                let what = match kind {
                    ReconcileKind::DirectMerge => "direct merge".green(),
                    ReconcileKind::Restructure { kept } => format!("restructured, kept {kept}").yellow(),
                };
                println!("  {} -> {}  {}", pair, new_index.to_string().bold(), what);
            }
            print!("{}", tree.dump(2));
        }
    }
    Ok(())
}

fn build_tree(
    variables: usize,
    shape: &str,
    tie_break: TieBreakPolicy,
    seed: u64,
) -> anyhow::Result<MergeTree> {
    let shape: TreeShape = shape.parse()?;
    Ok(MergeTreeBuilder::new(tie_break, SeededRng::shared(seed)).build(shape, 0..variables)?)
}

fn parse_pair(text: &str) -> anyhow::Result<MergePair> {
    let Some((first, second)) = text.split_once(',') else {
        bail!("merge must be written as a,b: {text}");
    };
    Ok(MergePair::of(first.parse()?, second.parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_parse_with_spaces() {
        assert_eq!(parse_pair("0, 2").unwrap(), MergePair::new(0, 2));
        assert!(parse_pair("0").is_err());
        assert!(parse_pair("0,x").is_err());
    }

    #[test]
    fn flags_override_defaults() {
        let args = RunArgs {
            task: TaskArgs { variables: 3, domain: 2 },
            config: None,
            tie_break: Some("keep-second".into()),
            seed: Some(5),
            shape: Some("balanced".into()),
            selector: Some("smallest_first".into()),
            dump: true,
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.tie_break, TieBreakPolicy::UseSecond);
        assert_eq!(config.seed, 5);
        assert_eq!(config.tree_shape, TreeShape::Balanced);
        assert!(config.dump_tree);
    }

    #[test]
    fn unknown_shape_and_selector_fail() {
        let args = RunArgs {
            task: TaskArgs { variables: 3, domain: 2 },
            config: None,
            tie_break: None,
            seed: None,
            shape: Some("bushy".into()),
            selector: None,
            dump: false,
        };
        assert!(resolve_config(&args).unwrap_err().to_string().contains("bushy"));
        let args = RunArgs {
            shape: None,
            selector: Some("greedy".into()),
            ..args
        };
        assert!(resolve_config(&args).unwrap_err().to_string().contains("greedy"));
    }

    #[test]
    fn unknown_tie_break_fails() {
        let args = RunArgs {
            task: TaskArgs { variables: 3, domain: 2 },
            config: None,
            tie_break: Some("keep_both".into()),
            seed: None,
            shape: None,
            selector: None,
            dump: false,
        };
        let err = resolve_config(&args).unwrap_err();
        assert!(err.to_string().contains("keep_both"));
    }
}
