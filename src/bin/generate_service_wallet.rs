// Generates a fresh service wallet for funding investment transfers.
// With MASTER_ENCRYPTION_KEY set, prints the key encrypted for SERVICE_PRIVATE_KEY.

use dotenv::dotenv;
use sonic_invest::wallet;
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let (service_wallet, private_key) = wallet::generate_service_wallet();
    let address = wallet::to_checksum_address(service_wallet.address())?;

    println!("🔑 New service wallet");
    println!("   Address: {}", address);

    match env::var("MASTER_ENCRYPTION_KEY") {
        Ok(master_key) if !master_key.trim().is_empty() => {
            let encrypted = wallet::encrypt_private_key(&private_key, master_key.trim());
            println!("   SERVICE_PRIVATE_KEY={}", encrypted);
            println!("   (encrypted with MASTER_ENCRYPTION_KEY)");
        }
        _ => {
            println!("   SERVICE_PRIVATE_KEY={}", private_key);
            println!("   ⚠️ MASTER_ENCRYPTION_KEY not set, key printed in plain text");
        }
    }

    println!("\nFund this address on Sonic before accepting investments.");
    Ok(())
}
