// Trivia infrastructure - Open Trivia Database HTTP client

mod open_trivia_client;

pub use open_trivia_client::OpenTriviaClient;
