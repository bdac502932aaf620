//! Print the values produced by the demonstration generators.

use {
    anyhow::{Context, Result},
    clap::{Parser, Subcommand},
    fubuki::{
        Builder,
        DEFAULT_STACK_PAGES,
        walk::{TreeNode, walk_list, walk_tree},
    },
    tracing::info,
    tracing_subscriber::EnvFilter,
};

#[derive(Parser)]
#[command(about = "Run a generator and print what it yields")]
struct Args
{
    /// Usable stack pages for the generator.
    #[arg(long, default_value_t = DEFAULT_STACK_PAGES)]
    stack_pages: usize,

    #[command(subcommand)]
    demo: Demo,
}

#[derive(Subcommand)]
enum Demo
{
    /// Walk a fixed binary tree in order.
    Tree,

    /// Yield the given integers one by one.
    List
    {
        #[arg(default_values_t = [3, 7, 5, 98, 2, 4])]
        values: Vec<i64>,
    },
}

fn main() -> Result<()>
{
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let builder = Builder::new().stack_pages(args.stack_pages);

    let values: Vec<i64> = match &args.demo {
        Demo::Tree => {
            let root = TreeNode::sample();
            let mut generator = builder
                .build::<i32, _>(|| walk_tree(&root))
                .context("Cannot create tree walker")?;
            generator.iter().map(i64::from).collect()
        },
        Demo::List{values} => {
            let mut generator = builder
                .build::<i64, _>(|| walk_list(values.iter().copied()))
                .context("Cannot create list generator")?;
            generator.iter().collect()
        },
    };

    info!(count = values.len(), "generator completed");

    for value in values {
        println!("{}", value);
    }

    Ok(())
}
