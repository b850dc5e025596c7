use ds_core::{
    Activity, DialogError, DialogResult, LaunchOptions, OutgoingMessage, SessionState, TurnInput,
    TurnStatus,
};

/// Turn-level services the dialog runtime relies on. Implemented by whatever owns the
/// dialog stack and the channel connection.
pub trait DialogHost {
    fn send(&mut self, message: OutgoingMessage) -> Result<(), DialogError>;

    fn active_dialog_id(&self) -> Option<&str>;

    fn begin_dialog(
        &mut self,
        dialog_id: &str,
        options: LaunchOptions,
    ) -> Result<TurnStatus, DialogError>;

    fn replace_dialog(
        &mut self,
        dialog_id: &str,
        options: LaunchOptions,
    ) -> Result<TurnStatus, DialogError>;

    fn end_dialog(&mut self, result: Option<DialogResult>) -> Result<TurnStatus, DialogError>;

    fn cancel_all_dialogs(&mut self) -> Result<(), DialogError>;
}

/// Lifecycle a host drives once per turn. The host owns [`SessionState`] and persists it
/// between calls.
pub trait Dialog: Send + Sync {
    fn id(&self) -> &str;

    fn begin(
        &self,
        host: &mut dyn DialogHost,
        state: &mut SessionState,
    ) -> Result<TurnStatus, DialogError>;

    fn continue_dialog(
        &self,
        host: &mut dyn DialogHost,
        state: &mut SessionState,
        activity: &Activity,
    ) -> Result<TurnStatus, DialogError>;

    fn resume(
        &self,
        host: &mut dyn DialogHost,
        state: &mut SessionState,
        input: Option<TurnInput>,
    ) -> Result<TurnStatus, DialogError>;
}
