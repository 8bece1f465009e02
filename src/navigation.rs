//! The navigation bar shown at the top of every page behind the log-in wall.

use maud::{Markup, html};

use crate::endpoints;

const ACTIVE_LINK_STYLE: &str = "block py-2 px-3 text-white bg-blue-700 rounded-sm lg:bg-transparent
    lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500";

const INACTIVE_LINK_STYLE: &str = "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100
    lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0
    dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700
    dark:hover:text-white lg:dark:hover:bg-transparent";

/// The top navigation bar.
///
/// The link whose URL matches `active_endpoint` is highlighted as the current
/// page. The log-out link is never highlighted since it has no page of its own.
pub struct NavBar<'a> {
    active_endpoint: &'a str,
}

impl<'a> NavBar<'a> {
    pub fn new(active_endpoint: &'a str) -> Self {
        Self { active_endpoint }
    }

    pub fn into_html(self) -> Markup {
        let links = [
            (endpoints::DASHBOARD_VIEW, "Dashboard"),
            (endpoints::ADD_EXPENSE, "Add Expense"),
            (endpoints::LOG_OUT, "Log out"),
        ];

        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href="/"
                        class="flex items-center space-x-3 rtl:space-x-reverse"
                    {
                        span
                            class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Spendlog"
                        }
                    }

                    div class="w-auto"
                    {
                        ul
                            class="font-medium flex flex-row space-x-4 lg:space-x-8
                            rtl:space-x-reverse dark:bg-gray-800 lg:dark:bg-gray-900"
                        {
                            @for (url, title) in links {
                                @let is_current =
                                    url != endpoints::LOG_OUT && url == self.active_endpoint;
                                li { (nav_link(url, title, is_current)) }
                            }
                        }
                    }
                }
            }
        )
    }
}

fn nav_link(url: &str, title: &str, is_current: bool) -> Markup {
    let style = if is_current {
        ACTIVE_LINK_STYLE
    } else {
        INACTIVE_LINK_STYLE
    };

    html!(
        a href=(url) class=(style) aria-current=[is_current.then_some("page")] { (title) }
    )
}

#[cfg(test)]
mod nav_bar_tests {
    use scraper::{Html, Selector};

    use crate::{endpoints, navigation::NavBar};

    fn render(active_endpoint: &str) -> Html {
        Html::parse_fragment(&NavBar::new(active_endpoint).into_html().into_string())
    }

    fn current_page_urls(html: &Html) -> Vec<String> {
        let selector = Selector::parse("a[aria-current=page]").unwrap();

        html.select(&selector)
            .map(|link| link.attr("href").unwrap().to_owned())
            .collect()
    }

    #[test]
    fn nav_bar_contains_all_links() {
        let html = render(endpoints::DASHBOARD_VIEW);

        for endpoint in [
            endpoints::DASHBOARD_VIEW,
            endpoints::ADD_EXPENSE,
            endpoints::LOG_OUT,
        ] {
            // Scoped to the link list so the brand link to "/" is not counted.
            let selector = Selector::parse(&format!("ul a[href=\"{endpoint}\"]")).unwrap();

            assert_eq!(
                html.select(&selector).count(),
                1,
                "want exactly one link to {endpoint}"
            );
        }
    }

    #[test]
    fn active_endpoint_is_marked_current() {
        for endpoint in [endpoints::DASHBOARD_VIEW, endpoints::ADD_EXPENSE] {
            let html = render(endpoint);

            assert_eq!(current_page_urls(&html), vec![endpoint.to_owned()]);
        }
    }

    #[test]
    fn log_out_link_is_never_current() {
        let html = render(endpoints::LOG_OUT);

        assert!(current_page_urls(&html).is_empty());
    }

    #[test]
    fn unlisted_endpoint_marks_nothing_current() {
        let html = render(endpoints::REGISTER);

        assert!(current_page_urls(&html).is_empty());
    }
}
