use ds_core::{LineLocation, Vars};
use serde_json::Value;

/// Session facade handed to handlers and hooks. Redirects only move the cursor; the
/// executor notices the move once the callback returns and restarts from there.
pub struct Convo<'a> {
    cursor: &'a mut LineLocation,
    values: &'a mut Vars,
}

impl<'a> Convo<'a> {
    pub fn new(cursor: &'a mut LineLocation, values: &'a mut Vars) -> Self {
        Self { cursor, values }
    }

    pub fn vars(&self) -> &Vars {
        self.values
    }

    pub fn var(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set_var(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn goto_thread(&mut self, thread: impl Into<String>) {
        self.cursor.thread = thread.into();
        self.cursor.index = 0;
    }

    pub fn repeat(&mut self) {
        self.cursor.index = self.cursor.index.saturating_sub(1);
    }

    pub fn thread(&self) -> &str {
        &self.cursor.thread
    }

    pub fn step_index(&self) -> usize {
        self.cursor.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn goto_thread_resets_index() {
        let mut cursor = LineLocation::new("default", 4);
        let mut values = Vars::new();
        let mut convo = Convo::new(&mut cursor, &mut values);
        convo.goto_thread("blue_path");
        assert_eq!(convo.thread(), "blue_path");
        assert_eq!(convo.step_index(), 0);
    }

    #[test]
    fn repeat_steps_back_one_line() {
        let mut cursor = LineLocation::new("default", 2);
        let mut values = Vars::new();
        Convo::new(&mut cursor, &mut values).repeat();
        assert_eq!(cursor, LineLocation::new("default", 1));
    }

    #[test]
    fn set_var_writes_through() {
        let mut cursor = LineLocation::new("default", 0);
        let mut values = Vars::new();
        let mut convo = Convo::new(&mut cursor, &mut values);
        convo.set_var("color", json!("red"));
        assert_eq!(convo.var("color"), Some(&json!("red")));
        assert_eq!(values.get("color"), Some(&json!("red")));
    }
}
