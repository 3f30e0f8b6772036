//! Button labels and the menus built from them.

use hostwake_core::Role;

/// A menu button.
///
/// Operators may tap the button or type its name; both are recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// Enter the host power menu.
    PcControl,
    /// Enter the admin menu.
    AdminPanel,
    /// Local network addresses.
    IpAddress,
    /// Uptime (local in the main menu, remote in the power menu).
    Uptime,
    /// Wake the host.
    TurnOn,
    /// Shut the host down.
    TurnOff,
    /// Return to the main menu.
    Back,
    /// Start the add-user flow.
    AddUser,
    /// Start the remove-user flow.
    RemoveUser,
    /// Start the change-role flow.
    ChangeRole,
    /// Start the change-MAC flow.
    ChangeMac,
    /// List the directory.
    List,
}

impl Label {
    /// Every label.
    pub const ALL: [Self; 12] = [
        Self::PcControl,
        Self::AdminPanel,
        Self::IpAddress,
        Self::Uptime,
        Self::TurnOn,
        Self::TurnOff,
        Self::Back,
        Self::AddUser,
        Self::RemoveUser,
        Self::ChangeRole,
        Self::ChangeMac,
        Self::List,
    ];

    /// The plain name, as an operator would type it.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PcControl => "PC control",
            Self::AdminPanel => "Admin panel",
            Self::IpAddress => "IP address",
            Self::Uptime => "Uptime",
            Self::TurnOn => "Turn on",
            Self::TurnOff => "Turn off",
            Self::Back => "Back",
            Self::AddUser => "Add user",
            Self::RemoveUser => "Remove user",
            Self::ChangeRole => "Change role",
            Self::ChangeMac => "Change MAC",
            Self::List => "List",
        }
    }

    /// The text shown on the button.
    #[must_use]
    pub const fn button(self) -> &'static str {
        match self {
            Self::PcControl => "💻 PC control",
            Self::AdminPanel => "⚙️ Admin panel",
            Self::IpAddress => "🌐 IP address",
            Self::Uptime => "🕒 Uptime",
            Self::TurnOn => "⚡ Turn on",
            Self::TurnOff => "⏻ Turn off",
            Self::Back => "🔙 Back",
            Self::AddUser => "➕ Add user",
            Self::RemoveUser => "➖ Remove user",
            Self::ChangeRole => "🛠 Change role",
            Self::ChangeMac => "🔧 Change MAC",
            Self::List => "📋 List",
        }
    }

    /// Recognize a button press or a typed label name.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        Self::ALL
            .into_iter()
            .find(|label| input == label.button() || input.eq_ignore_ascii_case(label.name()))
    }
}

/// An ordered grid of buttons attached to a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    rows: Vec<Vec<Label>>,
}

impl Menu {
    /// Build a menu from rows of labels.
    #[must_use]
    pub fn new(rows: Vec<Vec<Label>>) -> Self {
        Self { rows }
    }

    /// The main menu. Admin-only buttons are left out for users.
    #[must_use]
    pub fn main(role: Role) -> Self {
        if role.is_admin() {
            Self::new(vec![
                vec![Label::PcControl, Label::IpAddress],
                vec![Label::Uptime, Label::AdminPanel],
            ])
        } else {
            Self::new(vec![vec![Label::IpAddress, Label::Uptime]])
        }
    }

    /// The host power menu.
    #[must_use]
    pub fn pc_control() -> Self {
        Self::new(vec![
            vec![Label::TurnOn, Label::TurnOff],
            vec![Label::Uptime, Label::Back],
        ])
    }

    /// The admin menu.
    #[must_use]
    pub fn admin() -> Self {
        Self::new(vec![
            vec![Label::AddUser, Label::RemoveUser],
            vec![Label::ChangeRole, Label::List],
            vec![Label::ChangeMac, Label::Back],
        ])
    }

    /// Rows of labels, top to bottom.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Label>] {
        &self.rows
    }

    /// Rows of button texts, ready for a transport to render.
    #[must_use]
    pub fn button_rows(&self) -> Vec<Vec<&'static str>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|label| label.button()).collect())
            .collect()
    }

    /// Returns true if the menu contains `label`.
    #[must_use]
    pub fn contains(&self, label: Label) -> bool {
        self.rows.iter().flatten().any(|l| *l == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_buttons_and_names() {
        assert_eq!(Label::parse("💻 PC control"), Some(Label::PcControl));
        assert_eq!(Label::parse("PC control"), Some(Label::PcControl));
        assert_eq!(Label::parse("  add USER "), Some(Label::AddUser));
        assert_eq!(Label::parse("Change MAC"), Some(Label::ChangeMac));
        assert_eq!(Label::parse("reboot"), None);
    }

    #[test]
    fn labels_are_unambiguous() {
        for a in Label::ALL {
            assert_eq!(Label::parse(a.button()), Some(a));
            assert_eq!(Label::parse(a.name()), Some(a));
        }
    }

    #[test]
    fn main_menu_hides_admin_buttons_from_users() {
        let user = Menu::main(Role::User);
        assert!(!user.contains(Label::PcControl));
        assert!(!user.contains(Label::AdminPanel));
        assert!(user.contains(Label::Uptime));

        let admin = Menu::main(Role::Admin);
        assert!(admin.contains(Label::PcControl));
        assert!(admin.contains(Label::AdminPanel));
    }

    #[test]
    fn button_rows_keep_layout() {
        let rows = Menu::pc_control().button_rows();
        assert_eq!(rows, vec![vec!["⚡ Turn on", "⏻ Turn off"], vec!["🕒 Uptime", "🔙 Back"]]);
    }
}
