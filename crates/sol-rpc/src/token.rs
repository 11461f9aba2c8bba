//! SPL token operations that need a live connection.

use sol_core::spl_token;
use sol_core::{Address, Keypair};

use crate::connection::Connection;
use crate::error::Result;
use crate::sender::{PubsubSender, RpcSender};

/// Create the associated token account of `owner` for `mint`, paid by
/// `payer`, and return its address once the node accepts the transaction.
pub fn create_associated_token_account<S: RpcSender, P: PubsubSender>(
    connection: &Connection<S, P>,
    payer: &Keypair,
    mint: &Address,
    owner: &Address,
) -> Result<Address> {
    let associated_token = spl_token::get_associated_token_address(mint, owner, false)?;

    let mut transaction = spl_token::create_associated_token_account_transaction(
        &payer.pubkey(),
        &associated_token,
        owner,
        mint,
    );
    let signature = connection
        .sign_and_send_transaction(&mut transaction, &[payer])?
        .unwrap()?;

    tracing::debug!(%associated_token, %owner, %mint, %signature, "created associated token account");
    Ok(associated_token)
}
