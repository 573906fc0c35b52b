use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Shareable assessment link tokens are 24 mixed-case alphanumeric chars.
pub const ASSESSMENT_TOKEN_LENGTH: usize = 24;

/// Video access passwords avoid ambiguous characters (0/O, 1/I/l).
const PASSWORD_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const VIDEO_PASSWORD_LENGTH: usize = 6;

pub fn generate_assessment_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ASSESSMENT_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

pub fn generate_video_password() -> String {
    let mut rng = thread_rng();
    (0..VIDEO_PASSWORD_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..PASSWORD_ALPHABET.len());
            PASSWORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Raw session token as sent in the cookie; only its hash is stored.
pub fn generate_session_token() -> String {
    let bytes: [u8; 32] = thread_rng().gen();
    hex::encode(bytes)
}
