use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use coinsim_lib::commands::{self, Valuation};
use coinsim_lib::data::loader::load_ledger_csv;
use coinsim_lib::data::CsvPriceProvider;
use coinsim_lib::models::config::{AccountKind, AccountLimits, EnvConfig, SimulationConfig};
use coinsim_lib::models::strategy::StrategyKind;
use coinsim_lib::utils::export;

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulate coin price paths and score investment strategies")]
struct Cli {
    /// Directory of `<asset>.csv` price histories (overrides COINSIM_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// JSON file with simulation settings; flags override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// RNG seed for reproducible runs (overrides COINSIM_SEED)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one synthetic price path
    Simulate {
        #[command(flatten)]
        path: PathArgs,

        /// Write the path as CSV to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replay a ledger CSV (side,price,usd_amount,coin_amount) and report performance
    Evaluate {
        #[command(flatten)]
        path: PathArgs,

        #[command(flatten)]
        account: AccountArgs,

        /// Ledger CSV file
        #[arg(long)]
        ledger: PathBuf,

        /// Value against a simulated path instead of the history
        #[arg(long)]
        simulated: bool,
    },
    /// Score a DCA or lump-sum strategy across many simulated paths
    MonteCarlo {
        #[command(flatten)]
        path: PathArgs,

        #[command(flatten)]
        account: AccountArgs,

        /// Number of paths
        #[arg(long)]
        paths: Option<usize>,

        /// Buy this many dollars every `--every` days
        #[arg(long, conflicts_with = "lump_sum")]
        dca: Option<f64>,

        /// Days between DCA buys
        #[arg(long, default_value = "7")]
        every: usize,

        /// Buy this many dollars on day 0 and hold
        #[arg(long)]
        lump_sum: Option<f64>,

        /// Write the summary as CSV to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct PathArgs {
    /// Asset name, e.g. "bitcoin"
    #[arg(long)]
    asset: String,

    /// Days to simulate
    #[arg(long)]
    days: Option<usize>,

    /// Draw from the zero-sum return distribution
    #[arg(long)]
    zero_sum: bool,

    /// Starting price (defaults to the last historical price)
    #[arg(long)]
    start_price: Option<f64>,
}

#[derive(Args, Debug)]
struct AccountArgs {
    /// Account policy: unconstrained or funded
    #[arg(long)]
    account: Option<AccountKind>,

    /// Starting cash for funded accounts
    #[arg(long)]
    start_cash: Option<f64>,

    /// Reject trades that would make coin or cash balances negative
    #[arg(long)]
    strict: bool,
}

impl PathArgs {
    fn apply(&self, config: &mut SimulationConfig) {
        if let Some(days) = self.days {
            config.days = days;
        }
        if self.zero_sum {
            config.zero_sum = true;
        }
        if self.start_price.is_some() {
            config.start_price = self.start_price;
        }
    }
}

impl AccountArgs {
    fn apply(&self, config: &mut SimulationConfig) {
        if let Some(kind) = self.account {
            config.account = kind;
        }
        if let Some(cash) = self.start_cash {
            config.start_cash = cash;
        }
        if self.strict {
            config.limits = AccountLimits {
                allow_negative_coins: false,
                allow_negative_cash: false,
            };
        }
    }
}

fn main() -> Result<()> {
    coinsim_lib::init_tracing();

    let cli = Cli::parse();
    let env = EnvConfig::from_env().context("reading environment")?;

    let mut config = match &cli.config {
        Some(path) => SimulationConfig::from_json_file(path)?,
        None => SimulationConfig::default(),
    };
    config.seed = cli.seed.or(config.seed).or(env.seed);

    let provider = CsvPriceProvider::new(cli.data_dir.clone().unwrap_or(env.data_dir));
    info!("Using price data from {}", provider.data_dir().display());

    match &cli.command {
        Command::Simulate { path, out } => {
            path.apply(&mut config);
            let prices = commands::simulate(&provider, &path.asset, &config)?;
            match out {
                Some(file) => {
                    export::write_path_csv_file(&prices, file)?;
                    info!("Wrote {} prices to {}", prices.len(), file.display());
                }
                None if cli.json => println!("{}", export::to_json(&prices)?),
                None => export::write_path_csv(&prices, std::io::stdout())?,
            }
        }
        Command::Evaluate {
            path,
            account,
            ledger,
            simulated,
        } => {
            path.apply(&mut config);
            account.apply(&mut config);
            let entries = load_ledger_csv(ledger)?;
            let valuation = if *simulated {
                Valuation::Simulated
            } else {
                Valuation::Historical
            };
            let report =
                commands::evaluate_ledger(&provider, &path.asset, &entries, valuation, &config)?;
            if cli.json {
                println!("{}", export::to_json(&report.rounded())?);
            } else {
                println!("{}", export::format_report(&report));
            }
        }
        Command::MonteCarlo {
            path,
            account,
            paths,
            dca,
            every,
            lump_sum,
            out,
        } => {
            path.apply(&mut config);
            account.apply(&mut config);
            if let Some(n) = paths {
                config.paths = *n;
            }
            if let Some(usd) = dca {
                config.strategy = StrategyKind::DollarCostAverage {
                    usd_per_buy: *usd,
                    every_n_days: *every,
                };
            } else if let Some(usd) = lump_sum {
                config.strategy = StrategyKind::LumpSum { usd: *usd };
            }
            let summary = commands::monte_carlo(&provider, &path.asset, &config)?;
            if let Some(file) = out {
                let f = std::fs::File::create(file)
                    .with_context(|| format!("creating {}", file.display()))?;
                export::write_summary_csv(&summary, f)?;
            }
            if cli.json {
                println!("{}", export::to_json(&summary)?);
            } else {
                println!("{}", export::format_summary(&summary));
            }
        }
    }

    Ok(())
}
