use anyhow::anyhow;
use clap::Parser;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::EncodableKey;

pub const DEFAULT_JUPITER_BASE_URL: &str = "https://lite-api.jup.ag/swap/v1";

#[derive(Debug, Parser)]
pub struct CommonOpts {
    #[clap(long, env, help = "Solana cluster RPC-URL")]
    pub rpc_url: String,

    #[clap(long, env, help = "Path to the manager keypair file")]
    pub manager_file_path: String,

    #[clap(
        long,
        env,
        help = "Path to the admin keypair file, for admin-gated instructions"
    )]
    pub admin_file_path: Option<String>,

    #[clap(long, env, help = "The vault program ID")]
    pub vault_program_id: Pubkey,

    #[clap(long, env, help = "The vault account address")]
    pub vault: Pubkey,

    #[clap(long, env, help = "The vault's asset mint")]
    pub asset_mint: Pubkey,

    #[clap(long, env, default_value_t = spl_token::ID, help = "Token program owning the asset mint")]
    pub asset_token_program: Pubkey,

    #[clap(long, env, help = "The strategy adaptor program ID")]
    pub adaptor_program_id: Pubkey,

    #[clap(
        long,
        env,
        help = "Lookup table to reuse; a fresh one is derived when omitted"
    )]
    pub lookup_table_address: Option<Pubkey>,

    #[clap(long, env, default_value = DEFAULT_JUPITER_BASE_URL, help = "Base URL of the swap aggregator API")]
    pub jupiter_base_url: String,

    #[clap(long, env, help = "The URL to make priority fee requests to")]
    pub priofee_url: Option<String>,

    #[clap(
        long,
        env,
        help = "Fixed compute-unit price in micro-lamports, overrides the priofee estimate"
    )]
    pub compute_unit_price_micro_lamports: Option<u64>,
}

#[derive(Debug, Parser)]
pub struct SpotOpts {
    #[clap(long, env, help = "Oracle pricing the vault asset")]
    pub asset_oracle: Pubkey,

    #[clap(long, env, help = "The mint the strategy holds its position in")]
    pub foreign_mint: Pubkey,

    #[clap(long, env, default_value_t = spl_token::ID, help = "Token program owning the foreign mint")]
    pub foreign_token_program: Pubkey,

    #[clap(long, env, help = "Oracle pricing the foreign mint")]
    pub foreign_oracle: Pubkey,

    #[clap(long, env, default_value_t = 50, help = "Quote slippage in basis points")]
    pub slippage_bps: u16,

    #[clap(
        long,
        env,
        default_value_t = 16,
        help = "Maximum accounts the aggregator route may use"
    )]
    pub max_accounts: usize,

    #[clap(
        long,
        env,
        default_value_t = 0,
        help = "Abort unless the quote's worst-case output reaches this floor"
    )]
    pub minimum_threshold_amount_out: u64,
}

#[derive(Debug, Parser)]
pub struct EarnOpts {
    #[clap(long, env, help = "The lending program ID")]
    pub lend_program_id: Pubkey,

    #[clap(long, env, help = "The liquidity program ID")]
    pub liquidity_program_id: Pubkey,

    #[clap(long, env, help = "The rewards-rate program ID")]
    pub rewards_rate_program_id: Pubkey,
}

pub fn load_keypair(path: &str) -> anyhow::Result<Keypair> {
    Keypair::read_from_file(path).map_err(|e| anyhow!("reading keypair from {path}: {e}"))
}
