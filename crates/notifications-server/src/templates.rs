//! HTML bodies for outgoing notifications
//!
//! Caller-supplied text is escaped before interpolation; caller-supplied
//! markup (`html_content`) goes through the sanitizer instead.

pub const LOGIN_SUBJECT: &str = "🔐 Notificación de Inicio de Sesión";

/// Login alert addressed to `user_name`
pub fn login_alert(user_name: &str, email: &str, login_time: &str) -> String {
    let user_name = ammonia::clean_text(user_name);
    let email = ammonia::clean_text(email);
    let login_time = ammonia::clean_text(login_time);

    format!(
        r#"<html>
<body style="font-family: Arial, sans-serif; margin: 20px;">
    <div style="max-width: 600px; margin: 0 auto; border: 1px solid #ddd; border-radius: 10px; overflow: hidden;">
        <div style="background-color: #4CAF50; color: white; padding: 20px; text-align: center;">
            <h1 style="margin: 0;">🔐 Notificación de Acceso</h1>
        </div>
        <div style="padding: 20px;">
            <h2 style="color: #333;">Hola {user_name},</h2>
            <p style="color: #666; line-height: 1.6;">
                Te notificamos que se ha realizado un <strong>inicio de sesión exitoso</strong> en tu cuenta.
            </p>
            <div style="background-color: #f9f9f9; padding: 15px; border-radius: 5px; margin: 20px 0;">
                <p style="margin: 5px 0;"><strong>📧 Email:</strong> {email}</p>
                <p style="margin: 5px 0;"><strong>🕐 Hora:</strong> {login_time}</p>
            </div>
            <p style="color: #666; line-height: 1.6;">
                Si no fuiste tú quien inició sesión, por favor contacta al administrador del sistema inmediatamente.
            </p>
            <hr style="border: none; border-top: 1px solid #eee; margin: 20px 0;">
            <p style="color: #999; font-size: 12px; text-align: center;">
                Este es un mensaje automático del sistema de notificaciones.
            </p>
        </div>
    </div>
</body>
</html>"#
    )
}

/// Branded generic notification.
///
/// `html_content`, when given, replaces the highlighted message block.
pub fn notification(message: &str, html_content: Option<&str>) -> String {
    let highlighted = match html_content {
        Some(html) => ammonia::clean(html),
        None => format!(
            r#"<p style="margin: 0; color: #1976d2; font-weight: bold;">{}</p>"#,
            ammonia::clean_text(message)
        ),
    };

    format!(
        r#"<html>
<body style="font-family: Arial, sans-serif; background-color: #f4f4f4; margin: 0; padding: 0;">
    <div style="max-width: 600px; margin: 30px auto; background: #fff; border-radius: 8px; box-shadow: 0 2px 8px #eee;">
        <div style="background: #1976d2; color: #fff; padding: 20px; border-radius: 8px 8px 0 0;">
            <h1 style="margin: 0; font-size: 24px;">📢 Notificación Importante</h1>
        </div>
        <div style="padding: 24px;">
            <h2 style="color: #333; margin-top: 0;">¡Hola!</h2>
            <p style="color: #555; font-size: 16px;">
                Este es un mensaje automático enviado desde el sistema de notificaciones.
            </p>
            <div style="background: #f9f9f9; border-radius: 6px; padding: 16px; margin: 20px 0;">
                {highlighted}
            </div>
            <p style="color: #888; font-size: 13px;">
                Si tienes dudas, contacta al soporte.
            </p>
        </div>
        <div style="background: #eee; color: #999; text-align: center; padding: 12px; border-radius: 0 0 8px 8px; font-size: 12px;">
            Sistema de Notificaciones &copy; {year}
        </div>
    </div>
</body>
</html>"#,
        year = chrono::Utc::now().format("%Y")
    )
}
