//! # Categorías de Contenido
//! src/http/content.rs
//!
//! Clasificación interna del payload de una respuesta. Solo sirve para
//! elegir el valor del header `Content-Type`.

/// Categoría derivada de la extensión del target (o del método TRACE)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentCategory {
    /// Extensión listada en `imageExtensions`
    Image,

    /// Extensión `html`
    Html,

    /// Extensión `ico`
    Icon,

    /// Forzada para TRACE sin importar la extensión
    Message,

    /// Cualquier otra cosa
    #[default]
    Default,
}

impl ContentCategory {
    /// Clasifica un target ya normalizado
    ///
    /// La extensión es lo que sigue al último `.`; las extensiones de imagen
    /// se comparan por igualdad exacta (sensible a mayúsculas).
    ///
    /// # Ejemplo
    /// ```
    /// use static_http_server::http::ContentCategory;
    ///
    /// let images = vec!["png".to_string()];
    /// assert_eq!(ContentCategory::from_target("/a.png", &images), ContentCategory::Image);
    /// assert_eq!(ContentCategory::from_target("/a.PNG", &images), ContentCategory::Default);
    /// ```
    pub fn from_target(target: &str, image_extensions: &[String]) -> Self {
        let extension = target.rsplit_once('.').map_or(target, |(_, ext)| ext);

        if image_extensions.iter().any(|image| image == extension) {
            return ContentCategory::Image;
        }

        match extension {
            "html" => ContentCategory::Html,
            "ico" => ContentCategory::Icon,
            _ => ContentCategory::Default,
        }
    }

    /// Valor del header `Content-Type`
    pub fn content_type(&self) -> &'static str {
        match self {
            ContentCategory::Html => "text/html",
            ContentCategory::Image => "image",
            ContentCategory::Icon => "icon",
            ContentCategory::Message => "message/http",
            ContentCategory::Default => "application/octet-stream",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images() -> Vec<String> {
        vec!["jpg".to_string(), "png".to_string(), "gif".to_string()]
    }

    #[test]
    fn test_html_and_icon() {
        assert_eq!(ContentCategory::from_target("/index.html", &images()), ContentCategory::Html);
        assert_eq!(ContentCategory::from_target("/favicon.ico", &images()), ContentCategory::Icon);
    }

    #[test]
    fn test_configured_image_extensions() {
        assert_eq!(ContentCategory::from_target("/img/cat.gif", &images()), ContentCategory::Image);
        assert_eq!(ContentCategory::from_target("/img/cat.bmp", &images()), ContentCategory::Default);
    }

    #[test]
    fn test_image_match_is_exact_not_glob() {
        assert_eq!(ContentCategory::from_target("/a.jpgx", &images()), ContentCategory::Default);
        assert_eq!(ContentCategory::from_target("/a.JPG", &images()), ContentCategory::Default);
    }

    #[test]
    fn test_no_extension_is_default() {
        assert_eq!(ContentCategory::from_target("/README", &images()), ContentCategory::Default);
        assert_eq!(ContentCategory::from_target("/archive.tar.gz", &images()), ContentCategory::Default);
    }

    #[test]
    fn test_content_type_mapping() {
        assert_eq!(ContentCategory::Html.content_type(), "text/html");
        assert_eq!(ContentCategory::Image.content_type(), "image");
        assert_eq!(ContentCategory::Icon.content_type(), "icon");
        assert_eq!(ContentCategory::Message.content_type(), "message/http");
        assert_eq!(ContentCategory::Default.content_type(), "application/octet-stream");
    }
}
