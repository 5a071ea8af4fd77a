pub mod direct_withdraw;
pub mod earn;
pub mod query;
pub mod spot;

use anyhow::anyhow;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::signature::Keypair;

use crate::config::{load_keypair, CommonOpts};
use crate::jupiter::JupiterApiClient;
use crate::sender::SendOptions;

/// Per-run wiring shared by every subcommand: RPC and aggregator clients plus
/// the signing keys named on the command line.
pub struct OpsContext {
    pub rpc_client: RpcClient,
    pub jupiter: JupiterApiClient,
    pub manager: Keypair,
    pub admin: Option<Keypair>,
    pub common: CommonOpts,
}

impl OpsContext {
    pub fn from_opts(common: CommonOpts) -> anyhow::Result<Self> {
        let rpc_client = RpcClient::new_with_commitment(
            common.rpc_url.clone(),
            CommitmentConfig::confirmed(),
        );
        let jupiter = JupiterApiClient::new(common.jupiter_base_url.clone());
        let manager = load_keypair(&common.manager_file_path)?;
        let admin = common
            .admin_file_path
            .as_deref()
            .map(load_keypair)
            .transpose()?;
        Ok(OpsContext {
            rpc_client,
            jupiter,
            manager,
            admin,
            common,
        })
    }

    pub fn admin(&self) -> anyhow::Result<&Keypair> {
        self.admin
            .as_ref()
            .ok_or_else(|| anyhow!("this subcommand needs --admin-file-path"))
    }

    pub fn send_options(&self) -> SendOptions {
        SendOptions {
            compute_unit_price_micro_lamports: self.common.compute_unit_price_micro_lamports,
            priofee_url: self.common.priofee_url.clone(),
            compute_unit_limit: None,
        }
    }
}
