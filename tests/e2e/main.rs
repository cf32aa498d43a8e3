
mod test_batch;
mod test_history;
mod test_recognition;
mod test_synthesis;
