use clap::Parser;

mod config;
mod jupiter;
mod lut;
mod ops;
mod priofee;
mod sender;
mod swap_setup;
mod token;
mod vault;

use config::{CommonOpts, EarnOpts, SpotOpts};
use ops::OpsContext;

#[derive(Debug, Parser)]
#[clap(version, about, long_about = None)]
pub struct Opts {
    #[clap(flatten)]
    common: CommonOpts,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Parser)]
enum Command {
    /// Register the spot strategy and its oracle receipts with the vault
    InitializeSpot {
        #[clap(flatten)]
        spot: SpotOpts,
    },
    /// Swap vault assets into the foreign mint and deposit the position
    BuySpot {
        #[clap(flatten)]
        spot: SpotOpts,
        #[clap(long, env, help = "Amount to spend, in asset base units")]
        amount: u64,
    },
    /// Swap the foreign position back into vault assets and withdraw
    SellSpot {
        #[clap(flatten)]
        spot: SpotOpts,
        #[clap(long, env, help = "Amount to sell, in foreign base units")]
        amount: u64,
    },
    /// Register the lend strategy and provision its lookup table
    InitializeEarn {
        #[clap(flatten)]
        earn: EarnOpts,
    },
    /// Deposit vault assets into the lend strategy
    DepositEarn {
        #[clap(flatten)]
        earn: EarnOpts,
        #[clap(long, env, help = "Amount to deposit, in asset base units")]
        amount: u64,
    },
    /// Withdraw vault assets from the lend strategy
    WithdrawEarn {
        #[clap(flatten)]
        earn: EarnOpts,
        #[clap(long, env, help = "Amount to withdraw, in asset base units")]
        amount: u64,
    },
    /// Allow users to withdraw directly through an adaptor instruction
    InitDirectWithdraw {
        #[clap(flatten)]
        earn: EarnOpts,
        #[clap(
            long,
            env,
            value_delimiter = ',',
            help = "The 8 adaptor instruction discriminator bytes, comma separated"
        )]
        discriminator: Vec<u8>,
        #[clap(long, env, help = "Let users pass their own adaptor args")]
        allow_user_args: bool,
    },
    /// Print the vault's strategy positions and token balances
    QueryPositions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    let opts = Opts::parse();

    let ctx = OpsContext::from_opts(opts.common)?;
    match opts.command {
        Command::InitializeSpot { spot } => ops::spot::initialize_spot(&ctx, &spot).await,
        Command::BuySpot { spot, amount } => ops::spot::buy_spot(&ctx, &spot, amount).await,
        Command::SellSpot { spot, amount } => ops::spot::sell_spot(&ctx, &spot, amount).await,
        Command::InitializeEarn { earn } => ops::earn::initialize_earn(&ctx, &earn).await,
        Command::DepositEarn { earn, amount } => {
            ops::earn::deposit_earn(&ctx, &earn, amount).await
        }
        Command::WithdrawEarn { earn, amount } => {
            ops::earn::withdraw_earn(&ctx, &earn, amount).await
        }
        Command::InitDirectWithdraw {
            earn,
            discriminator,
            allow_user_args,
        } => {
            ops::direct_withdraw::init_direct_withdraw(
                &ctx,
                &earn,
                &discriminator,
                allow_user_args,
            )
            .await
        }
        Command::QueryPositions => ops::query::query_positions(&ctx).await,
    }
}
