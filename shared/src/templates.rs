use askama::Template;

#[derive(Template)]
#[template(path = "emails/welcome.html")]
pub struct WelcomeEmail<'a> {
    pub name: &'a str,
    pub dashboard_url: &'a str,
}

#[derive(Template)]
#[template(path = "emails/password_reset.html")]
pub struct PasswordResetEmail<'a> {
    pub name: &'a str,
    pub reset_url: &'a str,
    pub valid_minutes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_email_contains_link_and_escapes_name() {
        let html = PasswordResetEmail {
            name: "<Ann>",
            reset_url: "https://app.example/reset-password?token=abc",
            valid_minutes: 60,
        }
        .render()
        .unwrap();
        assert!(html.contains("token=abc"));
        assert!(html.contains("60 minutes"));
        assert!(html.contains("&lt;Ann&gt;"));
    }
}
