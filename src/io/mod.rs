use std::io::{self, Read};

/// Every key press is read as one fixed-size chunk, zero padded.
pub const READ_LEN: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    Up,
    Down,
    Left,
    Right,
    Flag,
    Open,
    Restart,
    Yes,
    No,
}

pub struct KeyTable {
    entries: Vec<([u8; READ_LEN], Action)>,
}

impl Default for KeyTable {
    fn default() -> Self {
        let mut table = Self { entries: Vec::new() };
        table.bind(&[27], Action::Quit);
        table.bind_letter(b'q', Action::Quit);

        table.bind(&[27, 91, 65], Action::Up);
        table.bind(&[27, 91, 66], Action::Down);
        table.bind(&[27, 91, 68], Action::Left);
        table.bind(&[27, 91, 67], Action::Right);
        table.bind_letter(b'w', Action::Up);
        table.bind_letter(b's', Action::Down);
        table.bind_letter(b'a', Action::Left);
        table.bind_letter(b'd', Action::Right);

        table.bind_letter(b'f', Action::Flag);
        table.bind(&[13], Action::Flag);
        table.bind(&[32], Action::Open);
        table.bind_letter(b'r', Action::Restart);

        table.bind_letter(b'y', Action::Yes);
        table.bind_letter(b'n', Action::No);
        table
    }
}

impl KeyTable {
    pub fn bind(&mut self, bytes: &[u8], action: Action) {
        let mut key = [0u8; READ_LEN];
        let n = bytes.len().min(READ_LEN);
        key[..n].copy_from_slice(&bytes[..n]);
        self.entries.push((key, action));
    }

    fn bind_letter(&mut self, lower: u8, action: Action) {
        self.bind(&[lower], action);
        self.bind(&[lower.to_ascii_uppercase()], action);
    }

    pub fn decode(&self, buf: &[u8; READ_LEN]) -> Option<Action> {
        self.entries
            .iter()
            .find(|(key, _)| key == buf)
            .map(|&(_, action)| action)
    }
}

/// Blocks for the next key press. Unknown sequences come back as `None`;
/// a closed input stream is an `UnexpectedEof` error.
pub fn read_action<R: Read>(input: &mut R, keys: &KeyTable) -> io::Result<Option<Action>> {
    let mut buf = [0u8; READ_LEN];
    let n = input.read(&mut buf)?;
    if n == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
    }
    Ok(keys.decode(&buf))
}

/// Waits for a yes/no answer, ignoring every other key.
pub fn read_confirmation<R: Read>(input: &mut R, keys: &KeyTable) -> io::Result<bool> {
    loop {
        match read_action(input, keys)? {
            Some(Action::Yes) => return Ok(true),
            Some(Action::No) => return Ok(false),
            _ => {}
        }
    }
}
