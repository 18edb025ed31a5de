//! Navbar user dropdown.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Landing,
    MyProfile,
    /// Another artist's public page.
    PublicProfile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Upload,
    Artist(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    UploadArt,
    YourArt,
    MyArt,
    HomePage,
    Logout,
}

impl MenuEntry {
    pub fn label(self) -> &'static str {
        match self {
            MenuEntry::UploadArt => "Upload Your Art",
            MenuEntry::YourArt => "Your Art",
            MenuEntry::MyArt => "My Art",
            MenuEntry::HomePage => "Home page",
            MenuEntry::Logout => "Logout",
        }
    }
}

/// What the caller must do after a menu choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Navigate(Route),
    /// Clear the session, then go home.
    Logout,
}

#[derive(Debug, Clone)]
pub struct UserMenu {
    page: Page,
    username: String,
    open: bool,
}

impl UserMenu {
    pub fn new(page: Page, username: impl Into<String>) -> Self {
        Self {
            page,
            username: username.into(),
            open: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    /// A pointer press that landed outside the dropdown.
    pub fn click_outside(&mut self) {
        self.open = false;
    }

    pub fn entries(&self) -> &'static [MenuEntry] {
        match self.page {
            Page::Landing => &[MenuEntry::UploadArt, MenuEntry::YourArt, MenuEntry::Logout],
            Page::MyProfile => &[MenuEntry::YourArt, MenuEntry::HomePage, MenuEntry::Logout],
            Page::PublicProfile => &[MenuEntry::HomePage, MenuEntry::MyArt, MenuEntry::Logout],
        }
    }

    /// The entry's caption as shown on this page.
    pub fn label(&self, entry: MenuEntry) -> &'static str {
        match (self.page, entry) {
            (Page::PublicProfile, MenuEntry::HomePage) => "Home Page",
            _ => entry.label(),
        }
    }

    /// Closes the menu and resolves the entry. Entries not offered on this
    /// page, or a closed menu, yield nothing.
    pub fn choose(&mut self, entry: MenuEntry) -> Option<MenuAction> {
        if !self.open || !self.entries().contains(&entry) {
            return None;
        }
        self.open = false;
        Some(match entry {
            MenuEntry::UploadArt => MenuAction::Navigate(Route::Upload),
            MenuEntry::YourArt | MenuEntry::MyArt => {
                MenuAction::Navigate(Route::Artist(self.username.clone()))
            }
            MenuEntry::HomePage => MenuAction::Navigate(Route::Home),
            MenuEntry::Logout => MenuAction::Logout,
        })
    }
}
