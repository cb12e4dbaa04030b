use base64::{engine::general_purpose::URL_SAFE_NO_PAD as B64URL, Engine as _};
use ed25519_dalek::{Signer, SigningKey};
use rand::{rngs::StdRng, SeedableRng};
use serde_json::json;
use std::sync::Arc;
use wellknown_jwt::{locate_token, now_ts, Access, Config, Jwk, MemoryKeyCache};

fn main() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    let sk = SigningKey::generate(&mut rng);

    // Pre-seed the cache so the demo never touches the network.
    let addr = "https://id.example/.well-known/jwk";
    let cache = Arc::new(MemoryKeyCache::new(3600));
    cache.put(addr, &serde_json::to_string(&Jwk::ed25519(&sk.verifying_key(), Some("demo")))?);
    let cfg = Config::new(addr).with_memory_cache(cache);

    let now = now_ts();
    let header = json!({"alg":"EdDSA","kid":"demo","typ":"JWT"});
    let payload = json!({ "jti":"user-42", "sco":"read,write", "iat":now, "exp": now+600 });
    let hdr = B64URL.encode(serde_json::to_string(&header)?);
    let pld = B64URL.encode(serde_json::to_string(&payload)?);
    let msg = format!("{}.{}", hdr, pld);
    let sig = sk.sign(msg.as_bytes());
    let jwt = format!("{}.{}", msg, B64URL.encode(sig.to_bytes()));

    let authorization = format!("Bearer {jwt}");
    let raw = locate_token(Some(authorization.as_str()), &[], &[]);
    match Access::scopes(["read", "write"]).check(raw, &cfg) {
        Ok(token) => println!("verified user = {} scopes = {:?}", token.user_id(), token.scopes()),
        Err(e) => println!("rejected with {}: {e}", e.status()),
    }
    Ok(())
}
