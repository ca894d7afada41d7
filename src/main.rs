use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use gramtab::{
    first_sets::FirstSets, follow_sets::FollowSets, grammar::Grammar, ll1, lr0::Automaton,
    parse_table::LR0Table,
};
use std::{fs, path::PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The kind of parsing table to derive.
    #[arg(long, value_enum, default_value_t = TableKind::Ll1)]
    table: TableKind,

    /// Write the derived table as CSV to the specified path.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// The path of the grammar definition file.
    input: PathBuf,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum TableKind {
    Ll1,
    Lr0,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::debug!("parsed CLI args = {:?}", args);

    process_file(&args)
        .with_context(|| anyhow::anyhow!("errored during processing {}", args.input.display()))?;

    Ok(())
}

fn process_file(args: &Args) -> anyhow::Result<()> {
    let grammar = Grammar::from_file(&args.input)?;
    println!("{}", grammar);

    let csv = match args.table {
        TableKind::Ll1 => {
            let first = FirstSets::new(&grammar);
            println!("FIRST sets:\n{}", first.display(&grammar));

            let follow = FollowSets::new(&grammar, &first);
            println!("FOLLOW sets:\n{}", follow.display(&grammar));

            let conflicts = ll1::check(&grammar, &first, &follow);
            if !conflicts.is_empty() {
                println!("The grammar is not LL(1):");
                for conflict in &conflicts {
                    println!("- {}", conflict.display(&grammar));
                }
                anyhow::bail!("the grammar is not LL(1)");
            }

            let table = ll1::LL1Table::generate(&grammar, &first, &follow);
            println!("LL(1) parsing table:\n{}", table.display(&grammar));
            table.to_csv(&grammar)
        }

        TableKind::Lr0 => {
            let automaton = Automaton::generate(&grammar);
            println!(
                "canonical collection ({} states):\n{}",
                automaton.state_count(),
                automaton.display(&grammar),
            );

            let table = LR0Table::generate(&grammar, &automaton);
            println!("LR(0) parsing table:\n{}", table.display(&grammar));
            table.to_csv(&grammar)
        }
    };

    if let Some(output) = &args.output {
        fs::write(output, csv)
            .with_context(|| anyhow::anyhow!("failed to write the table to {}", output.display()))?;
        println!("table written to {}", output.display());
    }

    Ok(())
}
