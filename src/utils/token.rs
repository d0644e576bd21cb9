use rand::{distributions::Alphanumeric, thread_rng, Rng};

const APIKEY_LENGTH: usize = 32;
const SECRET_TOKEN_LENGTH: usize = 48;

fn random_token(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

pub fn generate_apikey() -> String {
    random_token(APIKEY_LENGTH)
}

pub fn generate_secret_token() -> String {
    random_token(SECRET_TOKEN_LENGTH)
}
