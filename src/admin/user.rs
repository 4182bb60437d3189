use crate::admin::input;
use crate::admin::{AdminError, AdminResult};
use crate::api;
use crate::app::AppState;
use crate::auth::password;
use crate::config::{Config, RegexType};
use crate::schema::user;
use diesel::prelude::*;
use rustyline::DefaultEditor;
use tracing::info;

/// Sets the admin flag of the user named `username`.
pub fn set_admin(conn: &mut SqliteConnection, username: &str, is_admin: bool) -> AdminResult<()> {
    let updated_rows = diesel::update(user::table)
        .filter(user::username.eq(username))
        .set(user::is_admin.eq(is_admin))
        .execute(conn)?;
    match updated_rows {
        0 => Err(AdminError::UnknownUser(username.to_owned())),
        _ => Ok(()),
    }
}

/// Replaces the password of the user named `username` with `new_password`.
pub fn reset_password(
    conn: &mut SqliteConnection,
    config: &Config,
    username: &str,
    new_password: &str,
) -> AdminResult<()> {
    api::verify_matches_regex(config, new_password, RegexType::Password)?;
    let password_hash = password::hash_password(config, new_password)?;
    let updated_rows = diesel::update(user::table)
        .filter(user::username.eq(username))
        .set(user::password_hash.eq(&password_hash))
        .execute(conn)?;
    match updated_rows {
        0 => Err(AdminError::UnknownUser(username.to_owned())),
        _ => Ok(()),
    }
}

/// Prompts for a username and promotes or demotes that user.
pub fn change_privileges(state: &AppState, editor: &mut DefaultEditor, is_admin: bool) -> AdminResult<()> {
    let action = if is_admin { "promote" } else { "demote" };
    println!("Please enter the username of the user you would like to {action}. Enter \"done\" when finished.");
    let username = input::read("Username: ", editor)?;

    let mut conn = state.get_connection()?;
    set_admin(&mut conn, &username, is_admin)?;
    info!("Set admin flag of {username} to {is_admin}");
    Ok(())
}

/// Prompts for a username and a new password for that user.
pub fn reset_password_interactive(state: &AppState, editor: &mut DefaultEditor) -> AdminResult<()> {
    println!(
        "Please enter the username of the user you would like to reset a password for. Enter \"done\" when finished."
    );
    let username = input::read("Username: ", editor)?;

    let mut conn = state.get_connection()?;
    let user_exists: bool =
        diesel::select(diesel::dsl::exists(user::table.filter(user::username.eq(&username)))).get_result(&mut conn)?;
    if !user_exists {
        return Err(AdminError::UnknownUser(username));
    }

    let new_password = input::read("New password: ", editor)?;
    reset_password(&mut conn, &state.config, &username, &new_password)?;
    println!("Password reset successful.\n");
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::auth::header;
    use crate::model::user::User;
    use crate::test::*;

    fn is_admin(conn: &mut SqliteConnection, username: &str) -> bool {
        user::table
            .select(user::is_admin)
            .filter(user::username.eq(username))
            .first(conn)
            .unwrap()
    }

    #[test]
    fn promote_and_demote() {
        let (_dir, state) = test_state(|_| ());
        let mut conn = state.get_connection().unwrap();
        create_test_user(&mut conn, "painter", false).unwrap();

        set_admin(&mut conn, "painter", true).unwrap();
        assert!(is_admin(&mut conn, "painter"));
        set_admin(&mut conn, "painter", false).unwrap();
        assert!(!is_admin(&mut conn, "painter"));

        let result = set_admin(&mut conn, "nobody", true);
        assert!(matches!(result, Err(AdminError::UnknownUser(name)) if name == "nobody"));
    }

    #[test]
    fn password_reset() {
        let (_dir, state) = test_state(|_| ());
        let mut conn = state.get_connection().unwrap();
        create_test_user(&mut conn, "painter", false).unwrap();

        reset_password(&mut conn, &state.config, "painter", "new_password").unwrap();
        let user: User = header::verify_credentials(&mut conn, &state.config, "painter", "new_password").unwrap();
        assert_eq!(&*user.username, "painter");
        assert!(header::verify_credentials(&mut conn, &state.config, "painter", TEST_PASSWORD).is_err());

        assert!(matches!(
            reset_password(&mut conn, &state.config, "painter", "123"),
            Err(AdminError::Api(api::error::ApiError::ExpressionFailsRegex(RegexType::Password)))
        ));
        assert!(matches!(
            reset_password(&mut conn, &state.config, "nobody", "new_password"),
            Err(AdminError::UnknownUser(_))
        ));
    }
}
