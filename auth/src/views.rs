use minijinja::{context, AutoEscape, Environment};

use crate::error::AuthError;
use crate::outcome::ProviderStatus;
use crate::providers::ProviderDescriptor;

/// Marker in the page template replaced by the provider fragments
pub const CONTENT_MARKER: &str = "%%CONTENT%%";

const FRAGMENT_TEMPLATE_NAME: &str = "provider_fragment";

const FRAGMENT_TEMPLATE: &str = r#"
      <div class="column">
        <div class="callout" data-equalizer-watch>
          <div class="clearfix">
            <h4 class="float-left">{{ name }}</h4>
            {% if status == "auth" -%}
            <span class="success label float-right" style="margin-top: 5px">{{ label }}</span>
            {%- elif status == "error" -%}
            <span class="alert label float-right" style="margin-top: 5px">{{ label }}</span>
            {%- else -%}
            <span class="secondary label float-right" style="margin-top: 5px">{{ label }}</span>
            {%- endif %}
          </div>
          <pre class="json">{{ dump }}</pre>
          <div class="clearfix">
            <p>To log in with this provider, click the button below</p>
            <a href="/{{ name }}" class="button">Log In via {{ name }}</a>
          </div>
        </div>
      </div>
"#;

/// The status page: the page template split around its marker, plus the
/// per-provider fragment template. Built once at startup.
pub struct StatusPage {
    env: Environment<'static>,
    head: String,
    tail: String,
}

impl StatusPage {
    pub fn new(page_template: &str) -> Result<Self, AuthError> {
        let markers = page_template.matches(CONTENT_MARKER).count();
        if markers != 1 {
            return Err(AuthError::ConfigError(format!(
                "page template must contain {} exactly once, found {}",
                CONTENT_MARKER, markers
            )));
        }
        let (head, tail) = page_template
            .split_once(CONTENT_MARKER)
            .ok_or_else(|| AuthError::ConfigError("page template marker missing".to_string()))?;

        let mut env = Environment::new();
        // Provider names and cookie dumps are inserted verbatim. A profile
        // containing markup is rendered as markup (latent XSS).
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.add_template(FRAGMENT_TEMPLATE_NAME, FRAGMENT_TEMPLATE)?;

        Ok(Self {
            env,
            head: head.to_string(),
            tail: tail.to_string(),
        })
    }

    pub fn render_fragment(
        &self,
        provider: &ProviderDescriptor,
        status: &ProviderStatus,
    ) -> Result<String, AuthError> {
        let fragment = self.env.get_template(FRAGMENT_TEMPLATE_NAME)?.render(context! {
            name => provider.name(),
            status => status.kind(),
            label => status.label(),
            dump => status.dump(),
        })?;
        Ok(fragment)
    }

    /// Full document, fragments in the order given
    pub fn render<'a>(
        &self,
        entries: impl IntoIterator<Item = (&'a ProviderDescriptor, &'a ProviderStatus)>,
    ) -> Result<String, AuthError> {
        let mut html = self.head.clone();
        for (provider, status) in entries {
            html.push_str(&self.render_fragment(provider, status)?);
        }
        html.push_str(&self.tail);
        Ok(html)
    }
}
